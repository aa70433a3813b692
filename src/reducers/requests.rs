use crate::actions::{Action, ActionType};
use crate::environment::storage::{RequestState, RequestStatus, Requests};

pub(super) fn reduce(state: &mut Requests, action: &Action) {
    use ActionType::*;
    let (request, status) = match action.kind {
        CheckMfaRequest => (&mut state.check_mfa, RequestStatus::Started),
        CheckMfaSuccess => (&mut state.check_mfa, RequestStatus::Success),
        CheckMfaFailure => (&mut state.check_mfa, RequestStatus::Failure),
        LoginRequest => (&mut state.login, RequestStatus::Started),
        LoginSuccess => (&mut state.login, RequestStatus::Success),
        LoginFailure => (&mut state.login, RequestStatus::Failure),
        LogoutRequest => (&mut state.logout, RequestStatus::Started),
        ProfileRequest => (&mut state.get_profile, RequestStatus::Started),
        ProfileSuccess => (&mut state.get_profile, RequestStatus::Success),
        ProfileFailure => (&mut state.get_profile, RequestStatus::Failure),
        GetPostsSuccess => (&mut state.get_post, RequestStatus::Success),
        GetPostsFailure => (&mut state.get_post, RequestStatus::Failure),
        EditPostRequest => (&mut state.edit_post, RequestStatus::Started),
        EditPostSuccess => (&mut state.edit_post, RequestStatus::Success),
        EditPostFailure => (&mut state.edit_post, RequestStatus::Failure),
        MyPreferencesRequest => (&mut state.my_preferences, RequestStatus::Started),
        MyPreferencesSuccess => (&mut state.my_preferences, RequestStatus::Success),
        MyPreferencesFailure => (&mut state.my_preferences, RequestStatus::Failure),
        _ => return,
    };
    *request = RequestState {
        status,
        error: match status {
            RequestStatus::Failure => action.error.clone(),
            _ => None,
        },
    };
}
