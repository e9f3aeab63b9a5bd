/// WebSocket handling for gamepads and button boxes.
pub mod controller_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Player actions, gravity steps and high score persistence.
pub mod game_service;
/// Background gravity task.
pub mod gravity;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
