//! User settings state

use tracing::debug;

use crate::api::FinanceClient;
use crate::budget::MonthlySummary;
use crate::error::Result;
use crate::models::{Theme, UserSettings, UserSettingsUpdate};
use crate::target::{auto_income_target, current_savings_for_balance, EmergencyFundProgress};

use super::StoreStatus;

/// The user's settings, created with defaults on first fetch
///
/// Unlike the list stores, setters hand the error back as well as recording
/// it, so the caller can keep an edit form open.
pub struct SettingsStore {
    client: FinanceClient,
    settings: UserSettings,
    status: StoreStatus,
}

impl SettingsStore {
    pub fn new(client: FinanceClient) -> Self {
        Self {
            client,
            settings: UserSettings::default(),
            status: StoreStatus::default(),
        }
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }

    /// Load settings, writing a default row if the user has none
    pub async fn fetch(&mut self) {
        self.status.begin(true);
        match self.load_or_create().await {
            Ok(settings) => {
                self.settings = settings;
                self.status.finish();
            }
            Err(e) => self.status.fail("load settings", &e),
        }
    }

    async fn load_or_create(&self) -> Result<UserSettings> {
        if let Some(settings) = self.client.get_settings().await? {
            return Ok(settings);
        }
        debug!("No settings found, creating defaults");
        let defaults = UserSettingsUpdate {
            theme: Some(Theme::Light),
            monthly_income_target: Some(None),
            emergency_fund_goal: Some(None),
            total_savings: Some(None),
            current_savings: Some(Some(0.0)),
        };
        self.client.update_settings(&defaults).await
    }

    /// Write a partial update and apply it locally
    pub async fn update(&mut self, update: &UserSettingsUpdate) -> Result<()> {
        self.status.begin(false);
        match self.client.update_settings(update).await {
            Ok(_) => {
                self.settings.apply(update);
                Ok(())
            }
            Err(e) => {
                self.status.fail("update settings", &e);
                Err(e)
            }
        }
    }

    pub async fn set_monthly_income_target(&mut self, amount: Option<f64>) -> Result<()> {
        self.update(&UserSettingsUpdate {
            monthly_income_target: Some(amount),
            ..Default::default()
        })
        .await
    }

    pub async fn set_emergency_fund_goal(&mut self, amount: Option<f64>) -> Result<()> {
        self.update(&UserSettingsUpdate {
            emergency_fund_goal: Some(amount),
            ..Default::default()
        })
        .await
    }

    /// Manual monthly saving amount; `None` goes back to the net balance
    pub async fn set_saving_amount(&mut self, amount: Option<f64>) -> Result<()> {
        self.update(&UserSettingsUpdate {
            total_savings: Some(amount),
            ..Default::default()
        })
        .await
    }

    pub async fn set_current_savings(&mut self, amount: Option<f64>) -> Result<()> {
        self.update(&UserSettingsUpdate {
            current_savings: Some(amount),
            ..Default::default()
        })
        .await
    }

    pub async fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.settings.theme.toggled();
        self.update(&UserSettingsUpdate {
            theme: Some(theme),
            ..Default::default()
        })
        .await?;
        Ok(theme)
    }

    /// Emergency fund progress for a month under the current settings
    pub fn emergency_fund(&self, month: &MonthlySummary) -> EmergencyFundProgress {
        EmergencyFundProgress::compute(month, &self.settings)
    }

    /// Store the savings needed so the displayed balance equals `balance`
    pub async fn set_savings_balance(&mut self, balance: f64, month: &MonthlySummary) -> Result<()> {
        let monthly_savings = self.emergency_fund(month).monthly_savings;
        self.set_current_savings(Some(current_savings_for_balance(balance, monthly_savings)))
            .await
    }

    /// Adopt the month's income as the income target when it differs
    pub async fn sync_income_target(&mut self, month: &MonthlySummary) -> Result<bool> {
        match auto_income_target(month, &self.settings) {
            Some(income) => {
                self.set_monthly_income_target(Some(income)).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendClient, MemoryBackend};
    use crate::period::YearMonth;

    async fn signed_in_store() -> (SettingsStore, FinanceClient) {
        let backend = MemoryBackend::new();
        backend.add_user("sam@example.com", "hunter22");
        backend
            .sign_in_with_password("sam@example.com", "hunter22")
            .await
            .unwrap();
        let client = FinanceClient::new(BackendClient::Memory(backend));
        let mut store = SettingsStore::new(client.clone());
        store.fetch().await;
        assert!(store.status().error().is_none());
        (store, client)
    }

    fn june(income: f64, expenses: f64) -> MonthlySummary {
        MonthlySummary {
            month: YearMonth::new(2024, 6).unwrap(),
            total_income: income,
            total_expenses: expenses,
            net_balance: income - expenses,
            transaction_count: 2,
        }
    }

    #[tokio::test]
    async fn test_sync_income_target_only_when_changed() {
        let (mut store, client) = signed_in_store().await;

        assert!(store.sync_income_target(&june(3000.0, 1000.0)).await.unwrap());
        assert_eq!(store.settings().monthly_income_target, Some(3000.0));
        let persisted = client.get_settings().await.unwrap().unwrap();
        assert_eq!(persisted.monthly_income_target, Some(3000.0));

        assert!(!store.sync_income_target(&june(3000.0, 500.0)).await.unwrap());
        assert!(!store.sync_income_target(&june(0.0, 500.0)).await.unwrap());
        assert_eq!(store.settings().monthly_income_target, Some(3000.0));
    }

    #[tokio::test]
    async fn test_set_savings_balance_backs_out_monthly_savings() {
        let (mut store, client) = signed_in_store().await;
        let month = june(3000.0, 1000.0);

        store.set_savings_balance(5000.0, &month).await.unwrap();
        assert_eq!(store.settings().current_savings, Some(3000.0));
        assert_eq!(store.emergency_fund(&month).current_balance, 5000.0);
        let persisted = client.get_settings().await.unwrap().unwrap();
        assert_eq!(persisted.current_savings, Some(3000.0));

        // Below this month's savings the stored part bottoms out at zero
        store.set_savings_balance(500.0, &month).await.unwrap();
        assert_eq!(store.settings().current_savings, Some(0.0));
    }

    #[tokio::test]
    async fn test_saving_amount_overrides_net_balance() {
        let (mut store, client) = signed_in_store().await;
        let month = june(3000.0, 1000.0);

        store.set_saving_amount(Some(500.0)).await.unwrap();
        assert_eq!(store.emergency_fund(&month).monthly_savings, 500.0);
        let persisted = client.get_settings().await.unwrap().unwrap();
        assert_eq!(persisted.total_savings, Some(500.0));

        store.set_saving_amount(None).await.unwrap();
        assert_eq!(store.emergency_fund(&month).monthly_savings, 2000.0);
        assert_eq!(client.get_settings().await.unwrap().unwrap().total_savings, None);
    }

    #[tokio::test]
    async fn test_setter_failure_is_recorded_and_returned() {
        let (mut store, client) = signed_in_store().await;
        client.backend().sign_out().await.unwrap();

        assert!(store.sync_income_target(&june(3000.0, 0.0)).await.is_err());
        assert!(store.status().error().is_some());
        assert_eq!(store.settings().monthly_income_target, None);
    }
}
