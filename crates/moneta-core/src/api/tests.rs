use chrono::NaiveDate;

use super::*;
use crate::backend::{MemoryBackend, Table};
use crate::defaults::DEFAULT_CATEGORIES;
use crate::models::*;
use crate::period::YearMonth;

async fn signed_in_client() -> FinanceClient {
    let backend = MemoryBackend::new();
    backend.add_user("test@example.com", "secret");
    backend
        .sign_in_with_password("test@example.com", "secret")
        .await
        .unwrap();
    FinanceClient::new(BackendClient::Memory(backend))
}

fn june() -> YearMonth {
    YearMonth::new(2024, 6).unwrap()
}

fn new_tx(amount: f64, category: &str, day: u32, kind: TransactionType) -> NewTransaction {
    NewTransaction {
        amount,
        category: category.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
        notes: format!("{} on day {}", category, day),
        kind,
    }
}

#[tokio::test]
async fn test_requires_session() {
    let client = FinanceClient::new(BackendClient::Memory(MemoryBackend::new()));
    assert!(matches!(
        client.list_transactions().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        client.get_budgets(june()).await,
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_transaction_round_trip() {
    let client = signed_in_client().await;
    let submitted = new_tx(-42.5, "Groceries", 3, TransactionType::Expense);
    let added = client.add_transaction(&submitted).await.unwrap();

    let fetched = client.list_transactions().await.unwrap();
    assert_eq!(fetched.len(), 1);
    let t = &fetched[0];
    assert_eq!(t.id, added.id);
    assert_eq!(t.amount, -42.5);
    assert_eq!(t.category, "Groceries");
    assert_eq!(t.date, submitted.date);
    assert_eq!(t.notes, submitted.notes);
    assert_eq!(t.kind, TransactionType::Expense);
}

#[tokio::test]
async fn test_transactions_newest_first_and_update_delete() {
    let client = signed_in_client().await;
    let early = client
        .add_transaction(&new_tx(10.0, "Food", 2, TransactionType::Expense))
        .await
        .unwrap();
    let late = client
        .add_transaction(&new_tx(20.0, "Food", 25, TransactionType::Expense))
        .await
        .unwrap();

    let list = client.list_transactions().await.unwrap();
    assert_eq!(list[0].id, late.id);
    assert_eq!(list[1].id, early.id);

    let update = TransactionUpdate {
        amount: Some(12.0),
        notes: Some("lunch".into()),
        ..Default::default()
    };
    let updated = client.update_transaction(&early.id, &update).await.unwrap();
    assert_eq!(updated.amount, 12.0);
    assert_eq!(updated.notes, "lunch");
    assert_eq!(updated.category, "Food");

    assert!(matches!(
        client.update_transaction("missing", &update).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        client
            .update_transaction(&early.id, &TransactionUpdate::default())
            .await,
        Err(Error::InvalidData(_))
    ));

    client.delete_transaction(&early.id).await.unwrap();
    assert_eq!(client.list_transactions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_system_categories_cannot_be_deleted() {
    let client = signed_in_client().await;
    let seeded = client.setup_default_categories().await.unwrap();
    assert_eq!(seeded, DEFAULT_CATEGORIES.len());

    // Second run does nothing
    assert_eq!(client.setup_default_categories().await.unwrap(), 0);

    let categories = client.list_categories().await.unwrap();
    let system = categories.iter().find(|c| c.is_system).unwrap();
    assert!(matches!(
        client.delete_category(&system.id).await,
        Err(Error::InvalidData(_))
    ));

    let custom = client
        .add_category(&NewCategory {
            name: "Board Games".into(),
            color: "#123456".into(),
            kind: TransactionType::Expense,
        })
        .await
        .unwrap();
    assert!(!custom.is_system);
    client.delete_category(&custom.id).await.unwrap();
    assert_eq!(
        client.list_categories().await.unwrap().len(),
        DEFAULT_CATEGORIES.len()
    );
}

#[tokio::test]
async fn test_duplicate_category_name_rejected() {
    let client = signed_in_client().await;
    let category = NewCategory {
        name: "Coffee".into(),
        color: "#6b4226".into(),
        kind: TransactionType::Expense,
    };
    client.add_category(&category).await.unwrap();
    assert!(matches!(
        client.add_category(&category).await,
        Err(Error::Backend { status: 409, .. })
    ));
}

#[tokio::test]
async fn test_load_missing_defaults() {
    let client = signed_in_client().await;
    client
        .add_category(&NewCategory {
            name: "Groceries".into(),
            color: "#000000".into(),
            kind: TransactionType::Expense,
        })
        .await
        .unwrap();

    let added = client.load_missing_default_categories().await.unwrap();
    assert_eq!(added, DEFAULT_CATEGORIES.len() - 1);
    let categories = client.list_categories().await.unwrap();
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    // The user's own Groceries stays a user category
    let groceries = categories.iter().find(|c| c.name == "Groceries").unwrap();
    assert!(!groceries.is_system);
    assert_eq!(client.load_missing_default_categories().await.unwrap(), 0);
}

#[tokio::test]
async fn test_category_rename_carries_over_to_budgets() {
    let client = signed_in_client().await;
    let category = client
        .add_category(&NewCategory {
            name: "Food".into(),
            color: "#ff0000".into(),
            kind: TransactionType::Expense,
        })
        .await
        .unwrap();
    client.set_budget("Food", 100.0, june()).await.unwrap();
    client.set_recurring_budget("Food", 120.0).await.unwrap();
    client
        .add_transaction(&new_tx(5.0, "Food", 1, TransactionType::Expense))
        .await
        .unwrap();

    let update = CategoryUpdate {
        name: Some("Dining".into()),
        ..Default::default()
    };
    client.update_category(&category.id, &update).await.unwrap();

    let budgets = client.get_budgets(june()).await.unwrap();
    assert_eq!(budgets.get("Dining"), Some(&100.0));
    assert!(!budgets.contains_key("Food"));
    assert_eq!(
        client.get_recurring_budgets().await.unwrap().get("Dining"),
        Some(&120.0)
    );
    assert_eq!(client.list_transactions().await.unwrap()[0].category, "Dining");
}

#[tokio::test]
async fn test_budget_upsert_and_previous_month() {
    let client = signed_in_client().await;
    let january = YearMonth::new(2024, 1).unwrap();
    let december = YearMonth::new(2023, 12).unwrap();

    client.set_budget("Rent", 1000.0, december).await.unwrap();
    client.set_budget("Rent", 1100.0, december).await.unwrap();

    let copied = client.copy_from_previous_month(january).await.unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(copied.get("Rent"), Some(&1100.0));

    assert!(client.copy_from_previous_month(december).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_save_skips_non_positive() {
    let client = signed_in_client().await;
    let map: BudgetMap = [("Food", 100.0), ("Fun", 0.0), ("Gym", -5.0), ("Rent", 900.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    let written = client.set_bulk_budgets(&map, june()).await.unwrap();
    assert_eq!(written, 2);
    let saved = client.get_budgets(june()).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.contains_key("Food") && saved.contains_key("Rent"));
}

#[tokio::test]
async fn test_bulk_save_stops_at_first_failure() {
    let backend = MemoryBackend::new();
    backend.add_user("test@example.com", "secret");
    backend
        .sign_in_with_password("test@example.com", "secret")
        .await
        .unwrap();
    backend
        .store()
        .inject_failure(Table::Budgets, "category_name", "Fuel");
    let client = FinanceClient::new(BackendClient::Memory(backend));

    let map: BudgetMap = [("Books", 20.0), ("Fuel", 60.0), ("Rent", 900.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let result = client.set_bulk_budgets(&map, june()).await;
    assert!(matches!(result, Err(Error::Backend { status: 500, .. })));

    // Books was written before the failure, Rent never attempted
    let saved = client.get_budgets(june()).await.unwrap();
    assert_eq!(saved.keys().collect::<Vec<_>>(), vec!["Books"]);
}

#[tokio::test]
async fn test_recurring_templates_and_generation() {
    let client = signed_in_client().await;
    let templates: BudgetMap = [("Rent", 1200.0), ("Food", 300.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(client.set_bulk_recurring_budgets(&templates).await.unwrap(), 2);
    assert_eq!(client.get_recurring_budgets().await.unwrap(), templates);

    client.generate_monthly_budgets(june()).await.unwrap();
    client.generate_monthly_budgets(june()).await.unwrap();
    assert_eq!(client.get_budgets(june()).await.unwrap(), templates);

    client.delete_recurring_budget("Food").await.unwrap();
    let remaining = client.get_recurring_budgets().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.contains_key("Rent"));
}

#[tokio::test]
async fn test_settings_defaults_and_update() {
    let client = signed_in_client().await;
    assert!(client.get_settings().await.unwrap().is_none());

    let defaults = client.setup_default_settings().await.unwrap();
    assert_eq!(defaults.theme, Theme::Light);
    assert_eq!(defaults.total_savings, Some(0.0));

    let updated = client
        .update_settings(&UserSettingsUpdate {
            theme: Some(Theme::Dark),
            emergency_fund_goal: Some(Some(5000.0)),
            total_savings: Some(None),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.theme, Theme::Dark);
    assert_eq!(updated.emergency_fund_goal, Some(5000.0));
    assert_eq!(updated.total_savings, None);

    // Existing row is returned as is
    let again = client.setup_default_settings().await.unwrap();
    assert_eq!(again.theme, Theme::Dark);
}
