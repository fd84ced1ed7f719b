//! Integration tests for moneta-core
//!
//! These tests drive the client API and stores against the in-memory
//! backend: record → budget → summarize, plus month materialization.

use chrono::NaiveDate;
use moneta_core::{
    summarize_budget, summarize_month, Backend, BackendClient, BudgetMap, BudgetStatus,
    BudgetView, Direction, FinanceClient, MemoryBackend, NewTransaction, NoticeKind,
    RecurringStore, Table, TransactionStore, TransactionType, YearMonth,
};

async fn signed_in() -> (FinanceClient, MemoryBackend) {
    let backend = MemoryBackend::new();
    backend.add_user("alex@example.com", "correct horse");
    backend
        .sign_in_with_password("alex@example.com", "correct horse")
        .await
        .expect("sign in");
    (
        FinanceClient::new(BackendClient::Memory(backend.clone())),
        backend,
    )
}

fn month(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("valid month")
}

fn tx(amount: f64, category: &str, date: (i32, u32, u32), kind: TransactionType) -> NewTransaction {
    NewTransaction {
        amount,
        category: category.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        notes: String::new(),
        kind,
    }
}

fn budget_map(entries: &[(&str, f64)]) -> BudgetMap {
    entries
        .iter()
        .map(|(name, amount)| (name.to_string(), *amount))
        .collect()
}

// =============================================================================
// Record and Summarize
// =============================================================================

#[tokio::test]
async fn test_month_summary_workflow() {
    let (client, _) = signed_in().await;
    let june = month(2024, 6);

    let mut transactions = TransactionStore::new(client.clone());
    for new in [
        tx(50.0, "Food", (2024, 6, 3), TransactionType::Expense),
        tx(30.0, "Food", (2024, 6, 17), TransactionType::Expense),
        tx(3000.0, "Salary", (2024, 6, 28), TransactionType::Income),
        tx(999.0, "Food", (2024, 5, 31), TransactionType::Expense),
    ] {
        assert!(transactions.add(&new).await.is_some());
    }
    client.set_budget("Food", 100.0, june).await.unwrap();

    transactions.fetch().await;
    assert_eq!(transactions.transactions().len(), 4);

    let budgets = client.get_budgets(june).await.unwrap();
    let summary = summarize_budget(transactions.transactions(), &budgets, june);
    let food = summary.category("Food").expect("food budget");
    assert_eq!(food.spent, 80.0);
    assert_eq!(food.remaining, 20.0);
    assert_eq!(food.percentage, 80.0);
    assert_eq!(food.status, BudgetStatus::Warning);

    let monthly = summarize_month(transactions.transactions(), june);
    assert_eq!(monthly.total_income, 3000.0);
    assert_eq!(monthly.total_expenses, 80.0);
    assert_eq!(monthly.net_balance, 2920.0);
    assert_eq!(monthly.transaction_count, 3);
}

#[tokio::test]
async fn test_empty_month_summary() {
    let (client, _) = signed_in().await;
    let budgets = client.get_budgets(month(2024, 2)).await.unwrap();
    assert!(budgets.is_empty());

    let summary = summarize_budget(&[], &budgets, month(2024, 2));
    assert_eq!(summary.total_budget, 0.0);
    assert_eq!(summary.progress, 0.0);
    assert!(summary.categories.is_empty());
}

#[tokio::test]
async fn test_delete_unknown_transaction_is_noop() {
    let (client, backend) = signed_in().await;
    let mut transactions = TransactionStore::new(client);
    transactions
        .add(&tx(12.0, "Food", (2024, 6, 1), TransactionType::Expense))
        .await
        .unwrap();

    assert!(transactions.delete("does-not-exist").await);
    assert_eq!(transactions.transactions().len(), 1);
    assert_eq!(backend.store().row_count(Table::Transactions), 1);
    assert!(transactions.status().error().is_none());
}

// =============================================================================
// Recurring Budgets and Month Materialization
// =============================================================================

#[tokio::test]
async fn test_generation_is_idempotent() {
    let (client, backend) = signed_in().await;
    client
        .set_bulk_recurring_budgets(&budget_map(&[("Rent", 1200.0), ("Food", 400.0)]))
        .await
        .unwrap();

    let march = month(2025, 3);
    client.generate_monthly_budgets(march).await.unwrap();
    client.generate_monthly_budgets(march).await.unwrap();

    let budgets = client.get_budgets(march).await.unwrap();
    assert_eq!(budgets, budget_map(&[("Food", 400.0), ("Rent", 1200.0)]));
    assert_eq!(backend.store().row_count(Table::Budgets), 2);
}

#[tokio::test]
async fn test_view_materializes_empty_month() {
    let (client, _) = signed_in().await;
    let mut recurring = RecurringStore::new(client.clone());
    assert!(recurring.set("Rent", 1200.0).await);

    let mut view = BudgetView::new(client, month(2025, 3));
    view.load().await;

    assert!(view.is_loaded());
    assert_eq!(view.budgets().get("Rent"), Some(&1200.0));
    let notices = view.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Success);
    assert_eq!(notices[0].message, "Budget generated from recurring templates");

    // An already populated month loads without generating again
    view.load().await;
    assert!(view.take_notices().is_empty());
}

#[tokio::test]
async fn test_view_without_templates_stays_empty() {
    let (client, _) = signed_in().await;
    let mut view = BudgetView::new(client, month(2025, 4));
    view.load().await;

    assert!(view.is_loaded());
    assert!(view.budgets().is_empty());
    assert!(view.take_notices().is_empty());
}

#[tokio::test]
async fn test_view_generation_failure_is_informational() {
    let (client, backend) = signed_in().await;
    let mut recurring = RecurringStore::new(client.clone());
    assert!(recurring.set("Rent", 1200.0).await);
    backend.store().inject_rpc_failure("generate_monthly_budgets");

    let mut view = BudgetView::new(client, month(2025, 6));
    view.load().await;

    assert!(view.is_loaded());
    assert!(view.budgets().is_empty());
    assert!(view.status().error().is_none());
    let notices = view.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Info);
    assert_eq!(notices[0].message, "No recurring budgets applied for June 2025");
}

#[tokio::test]
async fn test_view_navigation_across_years() {
    let (client, _) = signed_in().await;
    client.set_budget("Gifts", 300.0, month(2024, 12)).await.unwrap();
    client.set_budget("Food", 250.0, month(2025, 1)).await.unwrap();

    let mut view = BudgetView::new(client, month(2025, 1));
    view.ensure_loaded().await;
    assert_eq!(view.budgets().get("Food"), Some(&250.0));

    let previous = view.navigate(Direction::Prev).await;
    assert_eq!(previous, month(2024, 12));
    assert_eq!(view.budgets(), &budget_map(&[("Gifts", 300.0)]));

    view.navigate(Direction::Next).await;
    assert_eq!(view.month(), month(2025, 1));
    assert_eq!(view.budgets(), &budget_map(&[("Food", 250.0)]));
}

#[tokio::test]
async fn test_copy_previous_month_into_view() {
    let (client, _) = signed_in().await;
    let mut view = BudgetView::new(client.clone(), month(2025, 1));
    view.load().await;

    let draft = view.copy_previous().await;
    assert!(draft.is_empty());
    assert_eq!(view.take_notices()[0].message, "No budget found for previous month");

    client.set_budget("Gifts", 300.0, month(2024, 12)).await.unwrap();
    let draft = view.copy_previous().await;
    assert_eq!(draft, budget_map(&[("Gifts", 300.0)]));

    assert!(view.save(&draft).await);
    let notices = view.take_notices();
    assert_eq!(notices.last().map(|n| n.message.as_str()), Some("Budget saved successfully"));
    assert_eq!(client.get_budgets(month(2025, 1)).await.unwrap(), draft);
}

#[tokio::test]
async fn test_bulk_save_partial_failure() {
    let (client, backend) = signed_in().await;
    backend
        .store()
        .inject_failure(Table::Budgets, "category_name", "Fuel");

    let mut view = BudgetView::new(client.clone(), month(2025, 5));
    view.load().await;
    let saved = view
        .save(&budget_map(&[("Books", 40.0), ("Fuel", 90.0), ("Rent", 1100.0)]))
        .await;

    assert!(!saved);
    assert!(view.status().error().is_some());
    let notices = view.take_notices();
    assert!(notices.iter().any(|n| n.kind == NoticeKind::Error));

    // Written before the failure, never attempted after it
    let stored = client.get_budgets(month(2025, 5)).await.unwrap();
    assert_eq!(stored, budget_map(&[("Books", 40.0)]));
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_users_see_only_their_rows() {
    let (client, backend) = signed_in().await;
    client
        .add_transaction(&tx(20.0, "Food", (2024, 6, 1), TransactionType::Expense))
        .await
        .unwrap();

    let other = backend.detached();
    other.add_user("sam@example.com", "hunter22");
    other
        .sign_in_with_password("sam@example.com", "hunter22")
        .await
        .unwrap();
    let other_client = FinanceClient::new(BackendClient::Memory(other));

    assert!(other_client.list_transactions().await.unwrap().is_empty());
    assert_eq!(client.list_transactions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sign_out_stops_data_access() {
    let (client, backend) = signed_in().await;
    backend.sign_out().await.unwrap();

    let err = client.list_transactions().await.unwrap_err();
    assert!(err.is_auth());
}
