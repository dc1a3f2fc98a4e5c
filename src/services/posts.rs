//! Post services - Pubblicazione, ricerca e interazioni sugli annunci

use crate::core::{AppError, AppState};
use crate::dtos::{
    AuthenticityResponseDTO, CreatePostDTO, NearbyPost, PostCursor, PostPage, UpdatePostDTO,
    UpdateUserDTO,
};
use crate::entities::{GeoPoint, Post, User};
use crate::repositories::{Create, Read, StoreError, Update};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

pub const NEARBY_RADIUS_KM: f64 = 10.0;
pub const MAX_EXCHANGE_SUGGESTIONS: usize = 3;
/// Limite di valori di una query "category in [...]" sul document database
const MAX_IN_QUERY_VALUES: usize = 10;

/// Post appena creato, con l'eventuale generazione 3D ancora in corso
pub struct CreatedPost {
    pub post: Post,
    pub model_job: Option<JoinHandle<()>>,
}

/// Pubblica un annuncio per conto dell'utente autenticato.
///
/// Se `model_source` è presente, la generazione del modello 3D parte in
/// background dopo che il post è già visibile; un fallimento viene solo loggato.
#[instrument(skip(state, current_user, body, model_source), fields(user_id = %current_user.user_id))]
pub async fn create_post(
    state: &Arc<AppState>,
    current_user: &User,
    mut body: CreatePostDTO,
    model_source: Option<&str>,
) -> Result<CreatedPost, AppError> {
    body.owner_id = current_user.user_id.clone();
    body.title = body.title.trim().to_string();
    body.validate()?;

    let post = state.post.create(&body).await?;
    info!(post_id = %post.post_id, "Post published");

    let model_job = model_source.map(|source| {
        let state = state.clone();
        let source = source.to_string();
        let post_id = post.post_id.clone();
        tokio::spawn(async move { generate_model(&state, &source, &post_id).await })
    });

    Ok(CreatedPost { post, model_job })
}

/// Generazione 2D->3D: al successo il modello viene agganciato al post
#[instrument(skip(state, source))]
async fn generate_model(state: &AppState, source: &str, post_id: &str) {
    let model_url = match state.models.generate(source, post_id).await {
        Ok(url) => url,
        Err(e) => {
            error!("Error during 2D-to-3D conversion: {}", e);
            return;
        }
    };
    let patch = UpdatePostDTO {
        model_url: Some(model_url),
    };
    match state.post.update(&post_id.to_string(), &patch).await {
        Ok(_) => info!("3D model linked to post"),
        Err(e) => warn!("Error saving 3D model url: {}", e),
    }
}

/// Pagina di annunci di una categoria, dal più recente
#[instrument(skip(state, cursor))]
pub async fn list_by_category(
    state: &AppState,
    category: &str,
    cursor: Option<&PostCursor>,
) -> Result<PostPage, AppError> {
    let page_size = state.config.post_page_size;
    let posts = state
        .post
        .find_by_category(category, cursor, page_size)
        .await?;
    let has_more = posts.len() == page_size;
    debug!(count = posts.len(), has_more, "Category page");
    Ok(PostPage {
        cursor: posts.last().map(PostCursor::from),
        has_more,
        posts,
    })
}

/// Annunci entro `radius_km` da `origin`, dal più vicino.
/// I post senza posizione sono esclusi.
#[instrument(skip(state))]
pub async fn nearby(
    state: &AppState,
    origin: GeoPoint,
    radius_km: f64,
) -> Result<Vec<NearbyPost>, AppError> {
    let mut nearby: Vec<NearbyPost> = state
        .post
        .find_all()
        .await?
        .into_iter()
        .filter_map(|post| {
            let distance_km = origin.distance_km(post.location.as_ref()?);
            (distance_km <= radius_km).then_some(NearbyPost { post, distance_km })
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    debug!(count = nearby.len(), "Nearby posts");
    Ok(nearby)
}

/// Apre il dettaglio del post, contando la visita solo per un visitatore nuovo
#[instrument(skip(state))]
pub async fn record_view(state: &AppState, post_id: &str, viewer_id: &str) -> Result<Post, AppError> {
    state
        .post
        .record_view(post_id, viewer_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::not_found("Post not found"),
            other => other.into(),
        })
}

/// Mette o toglie il like, tenendo allineati post e profilo dell'utente
///
/// # Returns
/// Il post aggiornato e il nuovo stato del like
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn toggle_like(
    state: &AppState,
    current_user: &User,
    post_id: &str,
) -> Result<(Post, bool), AppError> {
    let post = state
        .post
        .read(&post_id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    let liked = !post.likes.contains(&current_user.user_id);

    let post = state
        .post
        .set_like(post_id, &current_user.user_id, liked)
        .await?;
    state
        .user
        .update(
            &current_user.user_id,
            &UpdateUserDTO {
                liked_post: Some((post_id.to_string(), liked)),
                ..Default::default()
            },
        )
        .await?;
    debug!(liked, like_count = post.like_count, "Like toggled");
    Ok((post, liked))
}

/// Fino a 3 annunci nelle categorie che il proprietario accetta in cambio
#[instrument(skip(state, post), fields(post_id = %post.post_id))]
pub async fn exchange_suggestions(state: &AppState, post: &Post) -> Result<Vec<Post>, AppError> {
    if post.exchange_options.is_empty() {
        return Ok(Vec::new());
    }
    let categories: Vec<String> = post
        .exchange_options
        .iter()
        .take(MAX_IN_QUERY_VALUES)
        .cloned()
        .collect();
    Ok(state
        .post
        .find_in_categories(&categories, &post.post_id, MAX_EXCHANGE_SUGGESTIONS)
        .await?)
}

pub async fn posts_by_owner(state: &AppState, owner_id: &str) -> Result<Vec<Post>, AppError> {
    Ok(state.post.find_by_owner(owner_id).await?)
}

/// Chiede al classificatore se la foto è generata artificialmente
#[instrument(skip(state))]
pub async fn check_authenticity(
    state: &AppState,
    image_url: &str,
) -> Result<AuthenticityResponseDTO, AppError> {
    if image_url.trim().is_empty() {
        return Err(AppError::bad_request("No image to analyze"));
    }
    let result = state.authenticity.analyze(image_url).await?;
    info!(percentage = result.result.percentage, "Authenticity checked");
    Ok(result)
}
