//! Write-path forms: create user, deposit, withdraw.
//!
//! Every form is validated in full before anything is touched. A rejected
//! form leaves the [`Ledger`] exactly as it was.

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use wagerdesk_query::Timestamp;

use crate::reports::{BalanceEntry, Operation, User, UserStatus};

/// Why a form was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("login '{0}' is already taken")]
    LoginTaken(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient balance: {available:.2} available, {requested:.2} requested")]
    InsufficientBalance { available: f64, requested: f64 },

    #[error("no user with id {0}")]
    UnknownUser(u64),
}

impl ValidationError {
    /// The form field the message belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field) => *field,
            ValidationError::PasswordMismatch => "confirm",
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::LoginTaken(_) => "login",
            ValidationError::NonPositiveAmount | ValidationError::InsufficientBalance { .. } => {
                "amount"
            }
            ValidationError::UnknownUser(_) => "user_id",
        }
    }
}

/// Users plus their balance history: the state the forms mutate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ledger {
    pub users: Vec<User>,
    pub history: Vec<BalanceEntry>,
}

impl Ledger {
    pub fn new(users: Vec<User>, history: Vec<BalanceEntry>) -> Self {
        Ledger { users, history }
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn next_user_id(&self) -> u64 {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn next_entry_id(&self) -> u64 {
        self.history.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }

    /// Moves `amount` (signed) on a user's balance and records it.
    fn post(
        &mut self,
        user_id: u64,
        operation: Operation,
        amount: f64,
        at: Timestamp,
    ) -> Result<&BalanceEntry, ValidationError> {
        let id = self.next_entry_id();
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ValidationError::UnknownUser(user_id))?;

        let balance_before = user.balance;
        user.balance = round_cents(balance_before + amount);
        match operation {
            Operation::Deposit => user.deposit = round_cents(user.deposit + amount),
            Operation::Withdraw => user.withdraw = round_cents(user.withdraw - amount),
            _ => {}
        }

        let entry = BalanceEntry {
            id,
            user_id,
            login: user.login.clone(),
            operation,
            amount,
            balance_before,
            balance_after: user.balance,
            created_at: at,
        };
        info!(user_id, operation = operation.as_str(), amount, "balance updated");
        self.history.push(entry);
        Ok(&self.history[self.history.len() - 1])
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// New player account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateUserForm {
    pub login: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub name: Option<String>,
}

impl CreateUserForm {
    pub fn validate(&self, ledger: &Ledger) -> Result<(), ValidationError> {
        required(&self.login, "login")?;
        required(&self.email, "email")?;
        required(&self.password, "password")?;
        required(&self.confirm, "confirm")?;

        if self.password != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
        let login = self.login.trim();
        if ledger.users.iter().any(|u| u.login.eq_ignore_ascii_case(login)) {
            return Err(ValidationError::LoginTaken(login.to_string()));
        }
        Ok(())
    }

    /// Validates, then appends the new user with a zero balance.
    pub fn submit<'a>(
        &self,
        ledger: &'a mut Ledger,
        now: Timestamp,
    ) -> Result<&'a User, ValidationError> {
        self.validate(ledger)?;
        let login = self.login.trim().to_string();
        let user = User {
            id: ledger.next_user_id(),
            name: self.name.clone().unwrap_or_else(|| login.clone()),
            login,
            email: self.email.trim().to_string(),
            balance: 0.0,
            deposit: 0.0,
            withdraw: 0.0,
            status: UserStatus::Active,
            registered_at: now,
        };
        info!(id = user.id, login = %user.login, "user created");
        ledger.users.push(user);
        Ok(&ledger.users[ledger.users.len() - 1])
    }
}

/// Rounds to cents, then insists on at least one cent.
fn positive_cents(amount: f64) -> Result<f64, ValidationError> {
    let cents = round_cents(amount);
    if cents.is_finite() && cents > 0.0 {
        Ok(cents)
    } else {
        Err(ValidationError::NonPositiveAmount)
    }
}

/// Credit a user's balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositForm {
    pub user_id: u64,
    pub amount: f64,
}

impl DepositForm {
    /// Checks the form and returns the amount to post.
    pub fn validate(&self, ledger: &Ledger) -> Result<f64, ValidationError> {
        let amount = positive_cents(self.amount)?;
        ledger
            .user(self.user_id)
            .map(|_| amount)
            .ok_or(ValidationError::UnknownUser(self.user_id))
    }

    pub fn submit<'a>(
        &self,
        ledger: &'a mut Ledger,
        now: Timestamp,
    ) -> Result<&'a BalanceEntry, ValidationError> {
        let amount = self.validate(ledger)?;
        ledger.post(self.user_id, Operation::Deposit, amount, now)
    }
}

/// Debit a user's balance. The balance may not go negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawForm {
    pub user_id: u64,
    pub amount: f64,
}

impl WithdrawForm {
    pub fn validate(&self, ledger: &Ledger) -> Result<f64, ValidationError> {
        let amount = positive_cents(self.amount)?;
        let user = ledger
            .user(self.user_id)
            .ok_or(ValidationError::UnknownUser(self.user_id))?;
        if amount > user.balance {
            return Err(ValidationError::InsufficientBalance {
                available: user.balance,
                requested: amount,
            });
        }
        Ok(amount)
    }

    pub fn submit<'a>(
        &self,
        ledger: &'a mut Ledger,
        now: Timestamp,
    ) -> Result<&'a BalanceEntry, ValidationError> {
        let amount = self.validate(ledger)?;
        ledger.post(self.user_id, Operation::Withdraw, -amount, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> Timestamp {
        Timestamp::parse(text).unwrap()
    }

    fn ledger() -> Ledger {
        let user = User {
            id: 3,
            login: "vip_chen".into(),
            name: "Chen Li".into(),
            email: "chen@example.com".into(),
            balance: 100.0,
            deposit: 150.0,
            withdraw: 50.0,
            status: UserStatus::Active,
            registered_at: ts("2024-01-01"),
        };
        Ledger::new(vec![user], Vec::new())
    }

    fn signup() -> CreateUserForm {
        CreateUserForm {
            login: "newbie".into(),
            email: "newbie@example.com".into(),
            password: "hunter22".into(),
            confirm: "hunter22".into(),
            name: None,
        }
    }

    #[test]
    fn create_user_appends_with_next_id() {
        let mut ledger = ledger();
        let user = signup().submit(&mut ledger, ts("2024-06-01 10:00:00")).unwrap();
        assert_eq!(user.id, 4);
        assert_eq!(user.name, "newbie");
        assert_eq!(user.balance, 0.0);
        assert_eq!(ledger.users.len(), 2);
    }

    #[test]
    fn create_user_rejections() {
        let ledger = ledger();

        let form = CreateUserForm { login: " ".into(), ..signup() };
        assert_eq!(form.validate(&ledger), Err(ValidationError::Required("login")));

        let form = CreateUserForm { confirm: "other".into(), ..signup() };
        let err = form.validate(&ledger).unwrap_err();
        assert_eq!(err, ValidationError::PasswordMismatch);
        assert_eq!(err.field(), "confirm");

        let form = CreateUserForm { email: "nobody".into(), ..signup() };
        assert!(matches!(form.validate(&ledger), Err(ValidationError::InvalidEmail(_))));

        let form = CreateUserForm { login: "VIP_Chen".into(), ..signup() };
        assert!(matches!(form.validate(&ledger), Err(ValidationError::LoginTaken(_))));
    }

    #[test]
    fn deposit_updates_balance_and_history() {
        let mut ledger = ledger();
        let entry = DepositForm { user_id: 3, amount: 25.5 }
            .submit(&mut ledger, ts("2024-06-01 12:00:00"))
            .unwrap()
            .clone();

        assert_eq!(entry.id, 1);
        assert_eq!(entry.operation, Operation::Deposit);
        assert_eq!(entry.balance_before, 100.0);
        assert_eq!(entry.balance_after, 125.5);
        let user = ledger.user(3).unwrap();
        assert_eq!(user.balance, 125.5);
        assert_eq!(user.deposit, 175.5);
    }

    #[test]
    fn withdraw_records_negative_amount() {
        let mut ledger = ledger();
        let entry = WithdrawForm { user_id: 3, amount: 40.0 }
            .submit(&mut ledger, ts("2024-06-01 12:00:00"))
            .unwrap()
            .clone();

        assert_eq!(entry.amount, -40.0);
        assert_eq!(entry.balance_after, 60.0);
        assert_eq!(ledger.user(3).unwrap().withdraw, 90.0);
    }

    #[test]
    fn rejected_forms_change_nothing() {
        let mut ledger = ledger();
        let before = ledger.clone();
        let now = ts("2024-06-01");

        assert_eq!(
            DepositForm { user_id: 3, amount: 0.0 }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
        assert_eq!(
            DepositForm { user_id: 3, amount: f64::NAN }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
        assert_eq!(
            WithdrawForm { user_id: 3, amount: 100.01 }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::InsufficientBalance {
                available: 100.0,
                requested: 100.01
            }
        );
        assert_eq!(
            WithdrawForm { user_id: 99, amount: 1.0 }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::UnknownUser(99)
        );
        let form = CreateUserForm { confirm: "x".into(), ..signup() };
        assert!(form.submit(&mut ledger, now).is_err());

        assert_eq!(ledger, before);
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        let mut ledger = ledger();
        let before = ledger.clone();
        let now = ts("2024-06-01");

        assert_eq!(
            DepositForm { user_id: 3, amount: 0.004 }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
        assert_eq!(
            WithdrawForm { user_id: 3, amount: 0.004 }.submit(&mut ledger, now).unwrap_err(),
            ValidationError::NonPositiveAmount
        );
        assert_eq!(ledger, before);
        assert!(ledger.history.is_empty());

        let entry = DepositForm { user_id: 3, amount: 0.006 }
            .submit(&mut ledger, now)
            .unwrap();
        assert_eq!(entry.amount, 0.01);
    }

    #[test]
    fn withdraw_whole_balance_is_allowed() {
        let mut ledger = ledger();
        WithdrawForm { user_id: 3, amount: 100.0 }
            .submit(&mut ledger, ts("2024-06-01"))
            .unwrap();
        assert_eq!(ledger.user(3).unwrap().balance, 0.0);
    }
}
