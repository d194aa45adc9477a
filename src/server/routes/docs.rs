use axum::{Json, response::Html};
use serde_json::{Value, json};

/// Swagger UI shell; the OpenAPI document is served from `doc.json`.
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

pub async fn openapi_doc() -> Json<Value> {
    Json(openapi())
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>opztv-catalog API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    SwaggerUIBundle({
      url: "/api/swagger/doc.json",
      dom_id: "#swagger-ui",
      defaultModelsExpandDepth: -1,
    });
  </script>
</body>
</html>
"#;

fn openapi() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "opztv-catalog",
            "description": "Catalog of channel uploads and the games they feature.",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [{"url": "/api"}],
        "paths": {
            "/videos": {
                "get": {
                    "summary": "List videos with optional search and pagination",
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer", "default": 20}},
                        {"name": "offset", "in": "query", "schema": {"type": "integer", "default": 0}},
                        {"name": "search", "in": "query", "schema": {"type": "string"}, "description": "Match video title or linked game name"},
                    ],
                    "responses": {"200": {"description": "Video list with pagination meta"}},
                }
            },
            "/videos/{id}": {
                "get": {
                    "summary": "Get a video by its YouTube id",
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "Video"}, "500": {"description": "Unknown video or storage error"}},
                }
            },
            "/videos/{id}/game": {
                "put": {
                    "summary": "Link a game to a video",
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                    "requestBody": {"content": {"application/json": {"schema": {"type": "object", "properties": {"game_id": {"type": "string"}}, "required": ["game_id"]}}}},
                    "responses": {"200": {"description": "Linked"}, "400": {"description": "Invalid body"}, "404": {"description": "Unknown video"}},
                }
            },
            "/videos/sync": {
                "post": {
                    "summary": "Fetch recent channel uploads into the catalog",
                    "parameters": [{"name": "max_results", "in": "query", "schema": {"type": "integer", "default": 50}}],
                    "responses": {"200": {"description": "Sync counters"}},
                }
            },
            "/games": {
                "get": {
                    "summary": "List games with optional search and pagination",
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer", "default": 20}},
                        {"name": "offset", "in": "query", "schema": {"type": "integer", "default": 0}},
                        {"name": "search", "in": "query", "schema": {"type": "string"}},
                    ],
                    "responses": {"200": {"description": "Game list with pagination meta"}},
                },
                "post": {
                    "summary": "Create a game",
                    "requestBody": {"content": {"application/json": {"schema": {"type": "object", "properties": {"name": {"type": "string"}, "app_id": {"type": "string"}, "icon": {"type": "string"}, "logo": {"type": "string"}}, "required": ["name"]}}}},
                    "responses": {"201": {"description": "Created game"}, "200": {"description": "Game already catalogued under the same app_id"}},
                }
            },
            "/games/{id}": {
                "get": {
                    "summary": "Get a game by id",
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "Game"}, "500": {"description": "Unknown game or storage error"}},
                }
            },
            "/games/igdb/search": {
                "get": {
                    "summary": "Search IGDB by name",
                    "parameters": [{"name": "q", "in": "query", "required": true, "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "Search results"}, "400": {"description": "Missing query"}},
                }
            },
            "/games/steam/search": {
                "get": {
                    "summary": "Search Steam apps by name",
                    "parameters": [{"name": "q", "in": "query", "required": true, "schema": {"type": "string"}}],
                    "responses": {"200": {"description": "Search results"}, "400": {"description": "Missing query"}},
                }
            },
            "/databasez": {
                "get": {
                    "summary": "Database health",
                    "responses": {"200": {"description": "Healthy"}, "503": {"description": "Degraded"}},
                }
            }
        }
    })
}
