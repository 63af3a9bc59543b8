//! Behaviour Lifecycle Demo
//!
//! Demonstrates the Given/When/Then lifecycle:
//! - Default subject construction through the fixture
//! - Propagated failures in Throw mode
//! - Captured failures in Record mode
//!
//! Run with: cargo run --example wallet_demo

use behaviour_testing::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("insufficient funds: need {need}, have {have}")]
struct InsufficientFunds {
    need: u64,
    have: u64,
}

#[derive(Debug)]
struct Wallet {
    owner: String,
    balance: u64,
}

impl Wallet {
    async fn withdraw(&mut self, amount: u64) -> Result<u64, InsufficientFunds> {
        tokio::task::yield_now().await;
        if amount > self.balance {
            return Err(InsufficientFunds {
                need: amount,
                have: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}

impl Synthesize for Wallet {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(Self {
            owner: fixture.create()?,
            balance: fixture.create()?,
        })
    }
}

struct Withdrawing {
    state: BehaviourState<Wallet>,
    amount: u64,
    record: bool,
    teardowns: usize,
}

impl Withdrawing {
    fn new(amount: u64, record: bool) -> Self {
        Self {
            state: BehaviourState::new(),
            amount,
            record,
            teardowns: 0,
        }
    }
}

#[async_trait]
impl AsyncBehaviour for Withdrawing {
    type Subject = Wallet;

    fn state(&self) -> &BehaviourState<Wallet> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BehaviourState<Wallet> {
        &mut self.state
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn log_layout(&self) -> Result<Layout, LoggingError> {
        Layout::parse("${time} ${level} ${message}")
    }

    fn customize_fixture(&self, fixture: &mut Fixture) {
        fixture.inject(100u64);
    }

    async fn given(&mut self) -> Result<()> {
        if self.record {
            self.state.record_any_exceptions_thrown();
        }
        Ok(())
    }

    async fn when(&mut self) -> Result<()> {
        let wallet = self.state.subject_mut().context("no wallet")?;
        let left = wallet.withdraw(self.amount).await?;
        self.state
            .log()
            .info(format_args!("{} has {} left", wallet_owner(&self.state), left));
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        self.teardowns += 1;
        Ok(())
    }
}

fn wallet_owner(state: &BehaviourState<Wallet>) -> &str {
    state.subject().map(|w| w.owner.as_str()).unwrap_or("nobody")
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Behaviour Lifecycle Demo ===\n");

    println!("Demo 1: Successful withdrawal");
    let mut ok = Withdrawing::new(30, false);
    ok.execute().await?;
    println!("  teardowns: {}\n", ok.teardowns);

    println!("Demo 2: Overdraft in Throw mode");
    let mut throwing = Withdrawing::new(500, false);
    match throwing.execute().await {
        Ok(()) => bail!("overdraft should have failed"),
        Err(e) => println!("  propagated: {} (teardowns: {})\n", e, throwing.teardowns),
    }

    println!("Demo 3: Overdraft in Record mode");
    let mut recording = Withdrawing::new(500, true);
    recording.execute().await?;
    let thrown = recording
        .state()
        .thrown()
        .context("overdraft should have been captured")?;
    println!(
        "  captured: {} (is InsufficientFunds: {}, teardowns: {})",
        thrown,
        thrown.is::<InsufficientFunds>(),
        recording.teardowns
    );
    recording.conclude().await?;

    println!("\n=== All Demos Completed Successfully ===");
    Ok(())
}
