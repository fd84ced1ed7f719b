//! User settings singleton

use serde_json::{json, Value};
use tracing::info;

use super::{from_row, from_rows, FinanceClient, SETTINGS_CONFLICT};
use crate::backend::{Backend, Query, Table};
use crate::error::Result;
use crate::models::{Theme, UserSettings, UserSettingsUpdate};

impl FinanceClient {
    /// The user's settings row, if one exists
    pub async fn get_settings(&self) -> Result<Option<UserSettings>> {
        let user_id = self.user_id().await?;
        let query = Query::new().eq("user_id", &user_id).limit(1);
        let mut settings: Vec<UserSettings> =
            from_rows(self.backend.select(Table::UserSettings, &query).await?)?;
        Ok(settings.pop())
    }

    /// Write the given fields, creating the row if needed
    pub async fn update_settings(&self, update: &UserSettingsUpdate) -> Result<UserSettings> {
        let user_id = self.user_id().await?;
        let mut row = serde_json::to_value(update)?;
        row["user_id"] = Value::String(user_id);
        from_row(
            self.backend
                .upsert(Table::UserSettings, row, SETTINGS_CONFLICT)
                .await?,
        )
    }

    /// Create the settings row with defaults when the user has none
    pub async fn setup_default_settings(&self) -> Result<UserSettings> {
        if let Some(existing) = self.get_settings().await? {
            return Ok(existing);
        }
        let user_id = self.user_id().await?;
        let row = json!({
            "user_id": user_id,
            "theme": Theme::Light,
            "total_savings": 0.0,
        });
        let settings = from_row(
            self.backend
                .upsert(Table::UserSettings, row, SETTINGS_CONFLICT)
                .await?,
        )?;
        info!("Created default settings");
        Ok(settings)
    }
}
