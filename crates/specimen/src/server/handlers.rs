//! Route handlers.

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use specimen_core::{NewObservation, ObservationFilter};

use super::auth::{self, CurrentUser, LOGIN_PATH};
use super::error::AppError;
use super::state::AppState;
use super::templates::{pages, UploadOutcome};

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "image";

/// `GET /`: every observation, newest first.
pub async fn home(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Html<String>, AppError> {
    let observations = state
        .db
        .list_observations(&ObservationFilter::default())
        .await?;
    Ok(Html(pages()?.home(
        &user.username,
        &observations,
        &state.media_url,
    )?))
}

/// `GET /upload/`
pub async fn upload_form(user: CurrentUser) -> Result<Html<String>, AppError> {
    Ok(Html(pages()?.upload(&user.username, UploadOutcome::Empty)?))
}

/// `POST /upload/`: store, classify and record one photo.
///
/// A submission without a file re-renders the form. Classification
/// failures are still recorded and shown, with the failure label. If the
/// record cannot be written, the stored photo is removed again.
pub async fn upload_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if !file_name.is_empty() && !bytes.is_empty() {
            upload = Some((file_name, bytes));
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Ok(Html(
            pages()?.upload(&user.username, UploadOutcome::MissingFile)?,
        ));
    };

    let image = state.media.save(&file_name, &bytes).await?;
    let classification = state
        .processor
        .classify_bytes(bytes.to_vec(), &file_name)
        .await;
    let recorded = state
        .sink
        .record(NewObservation::from_classification(
            user.id,
            image.clone(),
            &classification,
        ))
        .await;
    let observation = match recorded {
        Ok(observation) => observation,
        Err(e) => {
            if let Err(remove_err) = state.media.remove(&image).await {
                tracing::warn!("Could not remove unrecorded upload {image}: {remove_err}");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        user = %user.username,
        observation = observation.id,
        species = %classification.label(),
        "Upload classified"
    );

    let image_url = format!("{}{}", state.media_url, image);
    Ok(Html(pages()?.upload(
        &user.username,
        UploadOutcome::Result {
            species: classification.label(),
            confidence_percent: classification.confidence_percent(),
            image_url: &image_url,
        },
    )?))
}

/// `GET /login/`
pub async fn login_form(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let logged_in = auth::session_token(&headers)
        .and_then(|token| state.sessions.get(&token))
        .is_some();
    if logged_in {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(Html(pages()?.login(None)?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `POST /login/`
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.db.authenticate(&form.username, &form.password).await? {
        Some(user) => {
            let token = state.sessions.create(&user);
            tracing::info!("User '{}' logged in", user.username);
            Ok((
                [(header::SET_COOKIE, state.sessions.cookie(&token))],
                Redirect::to("/"),
            )
                .into_response())
        }
        None => {
            tracing::warn!("Failed login for '{}'", form.username);
            Ok(Html(pages()?.login(Some("Invalid username or password."))?).into_response())
        }
    }
}

/// `GET|POST /logout/`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        state.sessions.remove(&token);
    }
    (
        [(header::SET_COOKIE, auth::clear_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let classifier = state.processor.classifier();
    Json(json!({
        "status": "ok",
        "version": specimen_core::VERSION,
        "model": classifier.model_name(),
        "species": classifier.labels().len(),
    }))
}
