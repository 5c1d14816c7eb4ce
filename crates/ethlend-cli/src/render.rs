//! Terminal output

use ethlend_client::{ActionOutcome, LendingController, Notice, Notifier};
use rust_decimal::Decimal;

/// Prints notices to the terminal
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_failure() {
            eprintln!("! {}", notice);
        } else {
            println!("{}", notice);
        }
    }
}

pub fn status(controller: &LendingController, address: Option<&str>) {
    let params = controller.params();
    let state = controller.state();

    println!("Ethlend");
    println!("  Collateral factor : {}%", params.collateral_factor_percent);
    println!("  Interest rate     : {}% per year", params.interest_rate_per_year);
    println!("  Max duration      : {} days", params.max_loan_duration_days());
    println!();
    println!("  Wallet            : {}", address.unwrap_or("not connected"));
    println!("  ETH price         : {} USD", price_text(state.eth_price));
    println!();

    if let Some(warning) = state.warning {
        println!("WARNING: {}", warning);
        println!();
    }

    loans(controller);
}

pub fn quote(amount: &str, collateral: Option<Decimal>) {
    println!("Borrow {} USDT", amount.trim());
    println!("  Required collateral: {} ETH", collateral_text(collateral));
}

pub fn loans(controller: &LendingController) {
    let views = controller.loan_views();
    if views.is_empty() {
        println!("No active loans");
        return;
    }

    println!("Your loans");
    for view in views {
        println!("  Loan #{}", view.number);
        println!("    Amount    : {} USDT", view.principal_usdt);
        println!("    Interest  : {} USDT", view.interest_usdt);
        println!("    Collateral: {} ETH", view.collateral_eth);
        println!("    Start     : {}", view.start());
        println!("    Expires   : {}", view.expiry());
    }
}

pub fn repay_outcome(number: usize, outcome: ActionOutcome) {
    if outcome == ActionOutcome::Skipped {
        println!("No loan #{} to repay", number);
    }
}

/// Price with two decimal places
fn price_text(price: Decimal) -> String {
    format!("{:.2}", price.round_dp(2))
}

fn collateral_text(collateral: Option<Decimal>) -> String {
    collateral
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string())
}
