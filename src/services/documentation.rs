use utoipa::OpenApi;

#[derive(OpenApi)]
/// OpenAPI document for the Fruitris server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::spectator_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::game::get_game,
        crate::routes::game::post_action,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSnapshot,
            crate::dto::game::ActionRequest,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::ws::ControllerInboundMessage,
            crate::dto::ws::ControllerAck,
            crate::dto::ws::ControllerRejected,
            crate::dto::ws::DeviceKind,
            crate::dto::sse::Handshake,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::LinesClearedEvent,
            crate::dto::sse::ControllerEvent,
            crate::dto::sse::InfoEvent,
            crate::input::Action,
            crate::input::InputSource,
            crate::input::buttons::ButtonScheme,
            crate::state::board::Tile,
            crate::state::tetromino::Shape,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game state and remote actions"),
        (name = "sse", description = "Spectator event stream"),
        (name = "controllers", description = "WebSocket operations for gamepads and button boxes"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/healthcheck", "/sse", "/ws", "/game", "/game/actions"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
