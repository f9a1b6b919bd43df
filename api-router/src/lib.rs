use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    conversation::{delete_conversation, get_conversation},
    message::{get_agent_response, send_message},
    probes::{live, ready},
    upload::send_file,
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for the conversation API.
pub fn api_routes<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route(
            "/conversation",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/sendMessage", post(send_message))
        .route(
            "/sendFile",
            post(send_file).layer(DefaultBodyLimit::max(
                app_state.config.upload_max_body_bytes,
            )),
        )
        .route("/getAgentResponse", post(get_agent_response))
        .route("/live", get(live))
        .route("/ready", get(ready))
}
