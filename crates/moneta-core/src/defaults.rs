//! Seeded category catalog for new users

use crate::models::{NewCategory, TransactionType};

/// Default categories as (name, color, type)
pub const DEFAULT_CATEGORIES: &[(&str, &str, TransactionType)] = &[
    ("Rent / Bond", "#ef4444", TransactionType::Expense),
    ("Mortgage", "#dc2626", TransactionType::Expense),
    ("Home Insurance", "#b91c1c", TransactionType::Expense),
    ("Property Tax", "#991b1b", TransactionType::Expense),
    ("Home Maintenance", "#7f1d1d", TransactionType::Expense),
    ("Electricity & Water", "#eab308", TransactionType::Expense),
    ("Internet & Cable", "#ca8a04", TransactionType::Expense),
    ("Heating & Cooling", "#a16207", TransactionType::Expense),
    ("Transport", "#22c55e", TransactionType::Expense),
    ("Fuel / Petrol", "#16a34a", TransactionType::Expense),
    ("Car Insurance", "#15803d", TransactionType::Expense),
    ("Car Maintenance", "#166534", TransactionType::Expense),
    ("Public Transport", "#14532d", TransactionType::Expense),
    ("Parking & Tolls", "#052e16", TransactionType::Expense),
    ("Car Registration", "#84cc16", TransactionType::Expense),
    ("Groceries", "#f97316", TransactionType::Expense),
    ("Restaurant / Takeout", "#ea580c", TransactionType::Expense),
    ("Coffee & Beverages", "#dc2626", TransactionType::Expense),
    ("Alcohol", "#b91c1c", TransactionType::Expense),
    ("Lunch at Work", "#f59e0b", TransactionType::Expense),
    ("Healthcare", "#06b6d4", TransactionType::Expense),
    ("Medications", "#0891b2", TransactionType::Expense),
    ("Dental Care", "#0e7490", TransactionType::Expense),
    ("Vision Care", "#155e75", TransactionType::Expense),
    ("Hair & Beauty", "#ec4899", TransactionType::Expense),
    ("Gym & Fitness", "#db2777", TransactionType::Expense),
    ("Personal Items", "#be185d", TransactionType::Expense),
    ("Clothing", "#9d174d", TransactionType::Expense),
    ("Airtime & Data", "#3b82f6", TransactionType::Expense),
    ("Software & Apps", "#2563eb", TransactionType::Expense),
    ("Electronics", "#1d4ed8", TransactionType::Expense),
    ("Phone Upgrades", "#1e40af", TransactionType::Expense),
    ("Computer & Tech", "#1e3a8a", TransactionType::Expense),
    ("Loan/Debt Payments", "#8b5cf6", TransactionType::Expense),
    ("Bank Fees", "#7c3aed", TransactionType::Expense),
    ("Investment Fees", "#6d28d9", TransactionType::Expense),
    ("Tax Preparation", "#5b21b6", TransactionType::Expense),
    ("Professional Development", "#4c1d95", TransactionType::Expense),
    ("Work Supplies", "#581c87", TransactionType::Expense),
    ("Education & Childcare", "#ec4899", TransactionType::Expense),
    ("School Supplies", "#db2777", TransactionType::Expense),
    ("Gifts", "#be185d", TransactionType::Expense),
    ("Pet Care", "#9d174d", TransactionType::Expense),
    ("Donations & Charity", "#831843", TransactionType::Expense),
    ("Baby Care", "#701a75", TransactionType::Expense),
    ("Entertainment", "#8b5cf6", TransactionType::Expense),
    ("Streaming Services", "#7c3aed", TransactionType::Expense),
    ("Movies & Events", "#6d28d9", TransactionType::Expense),
    ("Hobbies", "#5b21b6", TransactionType::Expense),
    ("Books & Magazines", "#4c1d95", TransactionType::Expense),
    ("Gaming", "#581c87", TransactionType::Expense),
    ("Shopping", "#ef4444", TransactionType::Expense),
    ("Home Decor", "#dc2626", TransactionType::Expense),
    ("Tools & Equipment", "#b91c1c", TransactionType::Expense),
    ("Office Supplies", "#991b1b", TransactionType::Expense),
    ("Vacation", "#06b6d4", TransactionType::Expense),
    ("Travel Insurance", "#0891b2", TransactionType::Expense),
    ("Accommodation", "#0e7490", TransactionType::Expense),
    ("Travel Transport", "#155e75", TransactionType::Expense),
    ("Emergency Fund", "#10b981", TransactionType::Expense),
    ("Retirement Savings", "#059669", TransactionType::Expense),
    ("Investment Contribution", "#047857", TransactionType::Expense),
    ("Other Expenses", "#64748b", TransactionType::Expense),
    ("Miscellaneous", "#475569", TransactionType::Expense),
    ("Salary", "#10b981", TransactionType::Income),
    ("Part-time Job", "#059669", TransactionType::Income),
    ("Freelance", "#06b6d4", TransactionType::Income),
    ("Consulting", "#0891b2", TransactionType::Income),
    ("Side Hustle", "#0e7490", TransactionType::Income),
    ("Investment", "#8b5cf6", TransactionType::Income),
    ("Dividends", "#7c3aed", TransactionType::Income),
    ("Interest Income", "#6d28d9", TransactionType::Income),
    ("Rental Income", "#5b21b6", TransactionType::Income),
    ("Capital Gains", "#4c1d95", TransactionType::Income),
    ("Bonus", "#f59e0b", TransactionType::Income),
    ("Tax Refund", "#d97706", TransactionType::Income),
    ("Insurance Payout", "#b45309", TransactionType::Income),
    ("Cash Gift", "#92400e", TransactionType::Income),
    ("Prize / Winnings", "#78350f", TransactionType::Income),
    ("Pension", "#047857", TransactionType::Income),
    ("Government Benefits", "#065f46", TransactionType::Income),
    ("Unemployment", "#064e3b", TransactionType::Income),
    ("Child Support", "#022c22", TransactionType::Income),
    ("Business Income", "#1e40af", TransactionType::Income),
    ("Commission", "#1e3a8a", TransactionType::Income),
    ("Royalties", "#1d4ed8", TransactionType::Income),
    ("Other Income", "#475569", TransactionType::Income),
];

/// The seeded catalog as insertable categories
pub fn default_categories() -> Vec<NewCategory> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color, kind)| NewCategory {
            name: name.to_string(),
            color: color.to_string(),
            kind: *kind,
        })
        .collect()
}

/// Defaults whose names are not already taken
pub fn missing_defaults<'a, I>(existing_names: I) -> Vec<NewCategory>
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: std::collections::HashSet<&str> = existing_names.into_iter().collect();
    default_categories()
        .into_iter()
        .filter(|c| !existing.contains(c.name.as_str()))
        .collect()
}

/// Colors offered when a category is created without one
pub const QUICK_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#3b82f6", "#8b5cf6", "#ec4899",
];

/// Pick a quick color for a new category name
pub fn color_for(name: &str) -> &'static str {
    let sum = name
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_add(b as usize));
    QUICK_COLORS[sum % QUICK_COLORS.len()]
}
