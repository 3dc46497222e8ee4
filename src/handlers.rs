use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    auth::{AuthUser, cleared_token_cookie, token_cookie},
    config::TokenSource,
    error::{AppError, ErrorBody},
    models::{
        Card, CreateCardRequest, DEFAULT_ABOUT, DEFAULT_AVATAR, DEFAULT_NAME, MessageResponse,
        NewCard, NewUser, SigninRequest, SigninResponse, SignupRequest, UpdateAvatarRequest,
        UpdateProfileRequest, User, UserPatch,
    },
    password::{hash_password, verify_password},
    validation::{ValidatedJson, parse_object_id},
};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

fn card_not_found() -> AppError {
    AppError::NotFound("Card not found".to_string())
}

// Same message for unknown email and wrong password: callers cannot tell which failed.
fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Incorrect email or password".to_string())
}

// --- Auth Handlers ---

/// signup
///
/// [Public Route] Registers a new user. The password is hashed before it reaches the
/// store, omitted profile fields take their defaults, and the response never carries
/// the hash.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<Json<User>, AppError> {
    let password_hash = hash_password(&payload.password).await?;

    let new_user = NewUser {
        name: payload.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        about: payload.about.unwrap_or_else(|| DEFAULT_ABOUT.to_string()),
        avatar: payload.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        email: payload.email,
        password_hash,
    };

    let user = state
        .repo
        .create_user(new_user)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(user))
}

/// signin
///
/// [Public Route] Exchanges email and password for a signed token. The token is always
/// returned in the body; in cookie mode it is additionally set as the HttpOnly `jwt`
/// cookie, which is then the only place protected routes will look.
#[utoipa::path(
    post,
    path = "/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Token issued", body = SigninResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorBody)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SigninRequest>,
) -> Result<(CookieJar, Json<SigninResponse>), AppError> {
    let credentials = state
        .repo
        .find_credentials_by_email(&payload.email)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?;

    let Some(credentials) = credentials else {
        tracing::warn!("signin rejected: unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &credentials.password_hash).await? {
        tracing::warn!(user_id = %credentials.user.id, "signin rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(&credentials.user.id)?;
    let jar = match state.config.token_source {
        TokenSource::Cookie => jar.add(token_cookie(&token, state.tokens.ttl())?),
        TokenSource::Bearer => jar,
    };

    tracing::info!(user_id = %credentials.user.id, "user signed in");
    Ok((jar, Json(SigninResponse { token })))
}

/// signout
///
/// [Authenticated Route] Clears the `jwt` cookie. Tokens are stateless, so a bearer
/// token stays valid until it expires; this only matters in cookie mode.
#[utoipa::path(
    post,
    path = "/signout",
    responses((status = 200, description = "Signed out", body = MessageResponse))
)]
pub async fn signout(
    AuthUser { id }: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    tracing::info!(user_id = %id, "user signed out");
    (
        jar.remove(cleared_token_cookie()),
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    )
}

// --- User Handlers ---

/// get_users
///
/// [Authenticated Route] Lists every user profile.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_users(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .repo
        .list_users()
        .await
        .map_err(|e| AppError::from_store(e, "user"))?;
    Ok(Json(users))
}

/// get_me
///
/// [Authenticated Route] The profile behind the presented token. A token for a user
/// that has since disappeared yields 404.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_me(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    state
        .repo
        .get_user(&id)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?
        .map(Json)
        .ok_or_else(user_not_found)
}

#[utoipa::path(
    get,
    path = "/users/{userId}",
    params(("userId" = String, Path, description = "24-character hex user id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user_id = parse_object_id(&user_id, "userId")?;
    state
        .repo
        .get_user(&user_id)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// update_profile
///
/// [Authenticated Route] Partial update of `name` and `about`. Fields left out of the
/// body keep their stored values.
#[utoipa::path(
    patch,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn update_profile(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let patch = UserPatch {
        name: payload.name,
        about: payload.about,
        avatar: None,
    };

    state
        .repo
        .update_user(&id, patch)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?
        .map(Json)
        .ok_or_else(user_not_found)
}

#[utoipa::path(
    patch,
    path = "/users/me/avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid avatar link", body = ErrorBody)
    )
)]
pub async fn update_avatar(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateAvatarRequest>,
) -> Result<Json<User>, AppError> {
    let patch = UserPatch {
        avatar: Some(payload.avatar),
        ..UserPatch::default()
    };

    state
        .repo
        .update_user(&id, patch)
        .await
        .map_err(|e| AppError::from_store(e, "user"))?
        .map(Json)
        .ok_or_else(user_not_found)
}

// --- Card Handlers ---

#[utoipa::path(
    get,
    path = "/cards",
    responses((status = 200, description = "All cards", body = [Card]))
)]
pub async fn get_cards(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Card>>, AppError> {
    let cards = state
        .repo
        .list_cards()
        .await
        .map_err(|e| AppError::from_store(e, "card"))?;
    Ok(Json(cards))
}

/// create_card
///
/// [Authenticated Route] Posts a new card. The owner is always the authenticated user,
/// never a value from the body.
#[utoipa::path(
    post,
    path = "/cards",
    request_body = CreateCardRequest,
    responses(
        (status = 200, description = "Created", body = Card),
        (status = 400, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn create_card(
    AuthUser { id }: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCardRequest>,
) -> Result<Json<Card>, AppError> {
    let card = state
        .repo
        .create_card(NewCard {
            name: payload.name,
            link: payload.link,
            owner: id,
        })
        .await
        .map_err(|e| AppError::from_store(e, "card"))?;

    tracing::info!(card_id = %card.id, owner = %card.owner, "card created");
    Ok(Json(card))
}

/// delete_card
///
/// [Authenticated Route] Removes a card and returns it.
///
/// *Authorization*: **Owner-Only**. Anyone else gets 403 and the card stays in place.
#[utoipa::path(
    delete,
    path = "/cards/{cardId}",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "Deleted", body = Card),
        (status = 403, description = "Not Owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_card(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, AppError> {
    let card_id = parse_object_id(&card_id, "cardId")?;

    let card = state
        .repo
        .get_card(&card_id)
        .await
        .map_err(|e| AppError::from_store(e, "card"))?
        .ok_or_else(card_not_found)?;

    if card.owner != user_id {
        tracing::warn!(%card_id, %user_id, "refused to delete a card owned by someone else");
        return Err(AppError::Forbidden(
            "You can only delete your own cards".to_string(),
        ));
    }

    let deleted = state
        .repo
        .delete_card(&card_id)
        .await
        .map_err(|e| AppError::from_store(e, "card"))?
        .ok_or_else(card_not_found)?;

    tracing::info!(%card_id, "card deleted");
    Ok(Json(deleted))
}

/// like_card
///
/// [Authenticated Route] Adds the caller to the card's likes. Repeating the call is a
/// no-op; the caller appears at most once.
#[utoipa::path(
    put,
    path = "/cards/{cardId}/likes",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "Liked", body = Card),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn like_card(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, AppError> {
    let card_id = parse_object_id(&card_id, "cardId")?;
    state
        .repo
        .add_like(&card_id, &user_id)
        .await
        .map_err(|e| AppError::from_store(e, "card"))?
        .map(Json)
        .ok_or_else(card_not_found)
}

#[utoipa::path(
    delete,
    path = "/cards/{cardId}/likes",
    params(("cardId" = String, Path, description = "24-character hex card id")),
    responses(
        (status = 200, description = "Like removed", body = Card),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn dislike_card(
    AuthUser { id: user_id }: AuthUser,
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<Card>, AppError> {
    let card_id = parse_object_id(&card_id, "cardId")?;
    state
        .repo
        .remove_like(&card_id, &user_id)
        .await
        .map_err(|e| AppError::from_store(e, "card"))?
        .map(Json)
        .ok_or_else(card_not_found)
}
