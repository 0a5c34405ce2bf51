use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("kurdcine.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("kurdcine.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("kurdcine.client.request_duration_seconds");

pub(crate) static AUTH_LOGINS: Counter = Counter::new("kurdcine.auth.logins");
pub(crate) static AUTH_LOGIN_FAILURES: Counter = Counter::new("kurdcine.auth.login_failures");
pub(crate) static AUTH_STALE_CREDENTIALS: Counter =
    Counter::new("kurdcine.auth.stale_credentials");

pub(crate) static CHAT_SENDS: Counter = Counter::new("kurdcine.chat.sends");
pub(crate) static CHAT_SEND_FAILURES: Counter = Counter::new("kurdcine.chat.send_failures");
pub(crate) static CHAT_REJECTED_SENDS: Counter = Counter::new("kurdcine.chat.rejected_sends");
pub(crate) static CHAT_STALE_REPLIES: Counter = Counter::new("kurdcine.chat.stale_replies");

pub(crate) static SESSION_REFRESH_FAILURES: Counter =
    Counter::new("kurdcine.sessions.refresh_failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&AUTH_LOGINS);
    collector.register_counter(&AUTH_LOGIN_FAILURES);
    collector.register_counter(&AUTH_STALE_CREDENTIALS);

    collector.register_counter(&CHAT_SENDS);
    collector.register_counter(&CHAT_SEND_FAILURES);
    collector.register_counter(&CHAT_REJECTED_SENDS);
    collector.register_counter(&CHAT_STALE_REPLIES);

    collector.register_counter(&SESSION_REFRESH_FAILURES);
}
