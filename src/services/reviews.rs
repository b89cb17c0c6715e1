use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::entities::{
    book, review, review_reaction,
    review_reaction::ReactionKind,
    user,
};
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::services::catalog::conflict_or_db;

pub struct NewReview {
    pub book_id: i32,
    pub rating: i16,
    pub comment: String,
}

#[derive(Default)]
pub struct ReviewFilter {
    pub book_id: Option<i32>,
    pub rating: Option<i16>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Review plus its reaction summary, shaped for API responses.
#[derive(Serialize)]
pub struct ReviewView {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub rating: i16,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub likes_count: usize,
    pub dislikes_count: usize,
    pub is_liked: bool,
    pub is_disliked: bool,
}

fn validate_rating(rating: i16) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

/// Creates a review, enforcing one review per (user, book) pair. A second
/// attempt is rejected and the first review is left untouched.
pub async fn create_review(
    db: &DatabaseConnection,
    actor: &user::Model,
    payload: NewReview,
) -> Result<review::Model, ApiError> {
    validate_rating(payload.rating)?;

    let txn = db.begin().await?;

    book::Entity::find_by_id(payload.book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No book with id {} was found", payload.book_id))
        })?;

    let duplicate = review::Entity::find()
        .filter(review::Column::UserId.eq(actor.id))
        .filter(review::Column::BookId.eq(payload.book_id))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::Conflict(
            "You have already reviewed this book".to_string(),
        ));
    }

    let new_review = review::ActiveModel {
        user_id: Set(actor.id),
        book_id: Set(payload.book_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    // The composite unique index backs up the pre-check under races.
    let created = match new_review.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
            return Err(conflict_or_db(err, "You have already reviewed this book"));
        }
    };

    txn.commit().await?;
    Ok(created)
}

pub async fn update_review(
    db: &DatabaseConnection,
    actor: &user::Model,
    review_id: i32,
    rating: Option<i16>,
    comment: Option<String>,
) -> Result<review::Model, ApiError> {
    let txn = db.begin().await?;

    let existing = review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review with id {} was found", review_id)))?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: existing.user_id,
        },
    )?;

    let mut active: review::ActiveModel = existing.into();
    if let Some(rating) = rating {
        validate_rating(rating)?;
        active.rating = Set(rating);
    }
    if let Some(comment) = comment {
        active.comment = Set(comment);
    }
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn delete_review(
    db: &DatabaseConnection,
    actor: &user::Model,
    review_id: i32,
) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    let existing = review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review with id {} was found", review_id)))?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: existing.user_id,
        },
    )?;

    review_reaction::Entity::delete_many()
        .filter(review_reaction::Column::ReviewId.eq(review_id))
        .exec(&txn)
        .await?;

    let active: review::ActiveModel = existing.into();
    active.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Toggles the actor's membership in one of the review's reaction sets.
/// Returns whether the reaction is present after the call. Like and dislike
/// are independent sets; toggling one does not clear the other.
pub async fn toggle_reaction(
    db: &DatabaseConnection,
    actor: &user::Model,
    review_id: i32,
    kind: ReactionKind,
) -> Result<bool, ApiError> {
    let txn = db.begin().await?;

    review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review with id {} was found", review_id)))?;

    let existing = review_reaction::Entity::find()
        .filter(review_reaction::Column::ReviewId.eq(review_id))
        .filter(review_reaction::Column::UserId.eq(actor.id))
        .filter(review_reaction::Column::Kind.eq(kind))
        .one(&txn)
        .await?;

    let active_now = match existing {
        Some(reaction) => {
            let reaction: review_reaction::ActiveModel = reaction.into();
            reaction.delete(&txn).await?;
            false
        }
        None => {
            let new_reaction = review_reaction::ActiveModel {
                review_id: Set(review_id),
                user_id: Set(actor.id),
                kind: Set(kind),
                ..Default::default()
            };
            new_reaction.insert(&txn).await?;
            true
        }
    };

    txn.commit().await?;
    Ok(active_now)
}

/// Lists reviews with reaction summaries. `viewer` controls the
/// `is_liked`/`is_disliked` flags and may be absent for anonymous reads.
pub async fn list_reviews(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    filter: ReviewFilter,
) -> Result<Vec<ReviewView>, ApiError> {
    let mut query = review::Entity::find();

    if let Some(book_id) = filter.book_id {
        query = query.filter(review::Column::BookId.eq(book_id));
    }
    if let Some(rating) = filter.rating {
        query = query.filter(review::Column::Rating.eq(rating));
    }
    if let Some(search) = filter.search {
        query = query.filter(review::Column::Comment.contains(&search));
    }

    query = match filter.ordering.as_deref() {
        Some("rating") => query.order_by_asc(review::Column::Rating),
        Some("-rating") => query.order_by_desc(review::Column::Rating),
        Some("created_at") => query.order_by_asc(review::Column::CreatedAt),
        _ => query.order_by_desc(review::Column::CreatedAt),
    };

    let reviews = query.all(db).await?;
    let mut views = Vec::with_capacity(reviews.len());
    for model in reviews {
        views.push(view_of(db, viewer, model).await?);
    }
    Ok(views)
}

pub async fn get_review(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    review_id: i32,
) -> Result<ReviewView, ApiError> {
    let existing = review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No review with id {} was found", review_id)))?;

    view_of(db, viewer, existing).await
}

async fn view_of(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    model: review::Model,
) -> Result<ReviewView, ApiError> {
    let reactions = review_reaction::Entity::find()
        .filter(review_reaction::Column::ReviewId.eq(model.id))
        .all(db)
        .await?;

    let likes_count = reactions
        .iter()
        .filter(|r| r.kind == ReactionKind::Like)
        .count();
    let dislikes_count = reactions.len() - likes_count;

    let (is_liked, is_disliked) = match viewer {
        Some(viewer) => (
            reactions
                .iter()
                .any(|r| r.kind == ReactionKind::Like && r.user_id == viewer.id),
            reactions
                .iter()
                .any(|r| r.kind == ReactionKind::Dislike && r.user_id == viewer.id),
        ),
        None => (false, false),
    };

    Ok(ReviewView {
        id: model.id,
        user_id: model.user_id,
        book_id: model.book_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at,
        likes_count,
        dislikes_count,
        is_liked,
        is_disliked,
    })
}
