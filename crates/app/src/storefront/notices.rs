//! User-facing notices and confirmation prompts.

use std::fmt;

use gamepart::{
    catalog::{CatalogError, InvalidInput},
    checkout::CheckoutError,
};
use serde::Serialize;
use tracing::error;

use crate::{
    auth::AuthError,
    domain::{catalog::CatalogServiceError, orders::OrdersServiceError},
    store::StoreError,
    storefront::StorefrontError,
};

/// Shown after an order was written.
pub const ORDER_PLACED: &str = "訂單已送出！感謝您的購買。";

/// Guidance for a store that rejects writes, typically a freshly created
/// hosted database whose access rules still deny everything.
pub const PERMISSION_GUIDANCE: &str = "資料庫拒絕了這次寫入（權限不足）。\n\
     若這是剛建立的資料庫，請在資料庫的存取規則中允許目前帳號讀寫 \
     parts、categories、cart 與 orders 集合，然後再試一次。";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&StorefrontError> for Notice {
    fn from(error: &StorefrontError) -> Self {
        match error {
            StorefrontError::Forbidden => Self::warning("需要管理員權限才能執行此操作。"),
            StorefrontError::MissingDescriptionInput => Self::warning("請先填寫名稱與類別"),
            StorefrontError::Catalog(error) => catalog_notice(error),
            StorefrontError::Checkout(error) => checkout_notice(error),
            StorefrontError::Orders(OrdersServiceError::Store(error)) => store_notice(error),
            StorefrontError::Auth(error) => auth_notice(error),
        }
    }
}

fn catalog_notice(error: &CatalogServiceError) -> Notice {
    match error {
        CatalogServiceError::Catalog(CatalogError::InvalidInput(invalid)) => match invalid {
            InvalidInput::EmptyCategoryName => Notice::warning("請輸入分類名稱"),
            InvalidInput::DuplicateCategory(name) => {
                Notice::warning(format!("分類「{name}」已存在"))
            }
            InvalidInput::EmptyPartName | InvalidInput::UnknownCategory(_) => {
                Notice::warning("請先填寫名稱與類別")
            }
            InvalidInput::EmptySubcategory => Notice::warning("請輸入或選擇一個子分類"),
        },
        CatalogServiceError::Catalog(CatalogError::CategoryNotFound(name)) => {
            Notice::warning(format!("找不到「{name}」分類"))
        }
        CatalogServiceError::Catalog(CatalogError::SubcategoryNotFound {
            category,
            subcategory,
        }) => Notice::warning(format!("找不到「{category} > {subcategory}」分類")),
        CatalogServiceError::Catalog(CatalogError::PartNotFound(_)) => {
            Notice::warning("找不到這個商品，可能已被刪除。")
        }
        CatalogServiceError::Store(error) => store_notice(error),
        CatalogServiceError::Fixture(source) => {
            error!("failed to load default catalog: {source}");

            Notice::error("預設商品資料載入失敗。")
        }
    }
}

fn store_notice(error: &StoreError) -> Notice {
    if error.is_permission_denied() {
        return Notice::error(PERMISSION_GUIDANCE);
    }

    error!("store write failed: {error}");

    Notice::error("無法儲存變更，請檢查連線後再試一次。")
}

fn checkout_notice(error: &CheckoutError) -> Notice {
    match error {
        CheckoutError::EmptyCart => Notice::warning("購物車是空的"),
        CheckoutError::InvalidTransition { .. } => Notice::warning("目前無法執行這個步驟。"),
    }
}

fn auth_notice(error: &AuthError) -> Notice {
    match error {
        AuthError::InvalidCredential => Notice::warning("帳號或密碼錯誤"),
        AuthError::WeakSecret => Notice::warning("密碼強度不足，請至少使用 6 個字元。"),
        AuthError::AccountExists => Notice::warning("此電子郵件已經註冊過了"),
        AuthError::SignUpUnsupported => Notice::warning("目前不開放註冊"),
        AuthError::Provider(_) | AuthError::Http(_) => {
            error!("identity provider failure: {error}");

            Notice::error("登入服務暫時無法使用，請稍後再試。")
        }
    }
}

/// Prompt shown before deleting a category and its parts.
#[must_use]
pub fn delete_category_prompt(category: &str, part_count: usize) -> String {
    format!("確定要刪除「{category}」分類嗎？\n將會一併刪除該分類下的 {part_count} 個商品。")
}

/// Prompt shown before deleting a subcategory and its parts.
#[must_use]
pub fn delete_subcategory_prompt(category: &str, subcategory: &str, part_count: usize) -> String {
    format!("確定要刪除「{category} > {subcategory}」分類嗎？\n將會刪除此分類下的 {part_count} 個商品。")
}

/// Prompt shown before deleting a single part.
pub const DELETE_PART_PROMPT: &str = "確定要刪除這個項目嗎?";
