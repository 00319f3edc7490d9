//! Category page route handlers.
//!
//! The page lists categories and recent orders. Every mutation is a form
//! POST to `/categories` carrying an `_intent` field.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use reward_sync_core::{CategoryId, CollectionId, CustomerTier};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    db::RewardStore,
    error::AppError,
    filters,
    models::{Category, Order},
    services::{CategoryForm, CategoryService, SyncService},
    state::AppState,
};

/// Number of orders shown below the category table.
const RECENT_ORDERS: i64 = 50;

/// Form posted by every control on the category page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIntentForm {
    /// `create`, `update`, `delete` or `syncProduct`.
    #[serde(rename = "_intent", default)]
    pub intent: String,
    /// Category ID (`update`, `delete`).
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elite_gross_margin: String,
    #[serde(default)]
    pub regular_gross_margin: String,
    /// Comma-separated collection IDs (`syncProduct`); empty syncs all.
    #[serde(default)]
    pub ids: String,
}

impl CategoryIntentForm {
    fn category(&self) -> CategoryForm {
        CategoryForm {
            name: self.name.clone(),
            elite_gross_margin: self.elite_gross_margin.clone(),
            regular_gross_margin: self.regular_gross_margin.clone(),
        }
    }

    fn category_id(&self) -> Result<CategoryId, AppError> {
        self.id
            .trim()
            .parse::<i32>()
            .map(CategoryId::new)
            .map_err(|_| AppError::Validation(format!("invalid category id {:?}", self.id)))
    }

    fn collection_ids(&self) -> Result<Vec<CollectionId>, AppError> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<CollectionId>()
                    .or_else(|_| CollectionId::from_gid(s))
                    .map_err(|_| AppError::Validation(format!("invalid collection id {s:?}")))
            })
            .collect()
    }
}

/// Category row for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub elite_gross_margin: String,
    pub regular_gross_margin: String,
    pub collection_id: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i32(),
            name: category.name.clone(),
            elite_gross_margin: category.elite_gross_margin.normalize().to_string(),
            regular_gross_margin: category.regular_gross_margin.normalize().to_string(),
            collection_id: category.collection_id.map(|id| id.to_string()),
        }
    }
}

/// Order row for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub name: String,
    pub customer_type: String,
    pub is_elite: bool,
    pub elite_reward: String,
    pub regular_reward: String,
    pub created_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            name: order.name.clone(),
            customer_type: order.customer_type.to_string(),
            is_elite: order.customer_type == CustomerTier::Elite,
            elite_reward: order.elite_reward.to_string(),
            regular_reward: order.regular_reward.to_string(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Result message shown above the table.
#[derive(Debug, Clone)]
pub struct Flash {
    pub message: String,
    pub is_error: bool,
}

/// Category page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryView>,
    pub orders: Vec<OrderView>,
    pub flash: Option<Flash>,
}

/// Category table and orders list.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Response {
    match render_page(&state, None).await {
        Ok(html) => html.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handle a form intent and re-render the page with the outcome.
#[instrument(skip(state, form), fields(intent = %form.intent))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CategoryIntentForm>,
) -> Response {
    let (status, flash) = match handle_intent(&state, &form).await {
        Ok(message) => (
            StatusCode::OK,
            Flash {
                message,
                is_error: false,
            },
        ),
        Err(err) => {
            err.report();
            (
                err.status(),
                Flash {
                    message: err.public_message(),
                    is_error: true,
                },
            )
        }
    };

    match render_page(&state, Some(flash)).await {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn handle_intent(state: &AppState, form: &CategoryIntentForm) -> Result<String, AppError> {
    let categories = CategoryService::new(state.store(), state.shopify());

    match form.intent.as_str() {
        "create" => {
            let category = categories.create(&form.category()).await?;
            Ok(match category.collection_id {
                Some(collection_id) => format!(
                    "Created category {} (collection {collection_id})",
                    category.name
                ),
                None => format!(
                    "Created category {} (no matching collection)",
                    category.name
                ),
            })
        }
        "update" => {
            let id = form.category_id()?;
            let category = categories.update(id, &form.category()).await?;
            Ok(format!("Updated category {}", category.name))
        }
        "delete" => {
            let id = form.category_id()?;
            let outcome = categories.delete(id).await?;
            let mut message = format!(
                "Deleted category and {} products with {} variants",
                outcome.products, outcome.variants
            );
            if outcome.reset_failures > 0 {
                message.push_str(&format!(
                    " ({} metafield resets failed)",
                    outcome.reset_failures
                ));
            }
            Ok(message)
        }
        "syncProduct" => {
            let ids = form.collection_ids()?;
            let report = SyncService::new(state.store(), state.shopify())
                .run(&ids)
                .await?;
            Ok(report.to_string())
        }
        other => Err(AppError::BadRequest(format!("unknown intent {other:?}"))),
    }
}

async fn render_page(state: &AppState, flash: Option<Flash>) -> Result<Html<String>, AppError> {
    let categories = CategoryService::new(state.store(), state.shopify())
        .list()
        .await?;
    let orders = state.store().list_orders(RECENT_ORDERS).await?;

    let template = CategoriesIndexTemplate {
        categories: categories.iter().map(CategoryView::from).collect(),
        orders: orders.iter().map(OrderView::from).collect(),
        flash,
    };

    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template render error: {e}")))
}
