use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::DEFAULT_COOKIE_NAME;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::session::current_session,
		routes::session::decision
	),
	components(
		schemas(
			models::claim::Role,
			models::claim::VerificationStatus,
			models::claim::IdentityClaim,
			models::session::SessionResponse,
			models::session::DecisionKind,
			models::session::DecisionResponse,
			crate::gate::RouteCategory,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Gate", description = "Route access decisions for the dashboard")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_operation_security(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc).unwrap_or(Value::Null));

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else { return; };
	let Some(components) = root
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
	else {
		return;
	};
	let Some(schemes) = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
	else {
		return;
	};

	schemes.insert(
		"cookieAuth".to_string(),
		json!({
			"type": "apiKey",
			"in": "cookie",
			"name": DEFAULT_COOKIE_NAME
		}),
	);
	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
}

/// Everything under `/api` except health reads the access token.
fn ensure_operation_security(doc: &mut Value) {
	let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else { return; };

	for (path, item) in paths.iter_mut() {
		if path == "/api/health" {
			continue;
		}
		let Some(operations) = item.as_object_mut() else { continue; };
		for operation in operations.values_mut() {
			if let Some(obj) = operation.as_object_mut() {
				obj.entry("security")
					.or_insert_with(|| json!([{ "cookieAuth": [] }, { "bearerAuth": [] }]));
			}
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
