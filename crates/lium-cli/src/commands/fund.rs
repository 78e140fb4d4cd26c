use super::sdk;
use crate::{
    config::Config,
    display::{print_info, print_success, prompt_input, Table},
    Result,
};
use clap::Subcommand;
use lium_api::ApiError;
use serde_json::Value;

#[derive(Subcommand, Debug)]
pub enum FundCommands {
    /// Show account balance
    Balance,
    /// List linked wallets
    Wallets,
    /// Start a TAO payment
    Pay {
        /// Amount in USD
        #[arg(long)]
        amount: f64,
    },
    /// Link a Bittensor coldkey to the account
    Link {
        /// Coldkey SS58 address
        #[arg(long)]
        coldkey: String,
    },
}

pub async fn handle(action: FundCommands, config: &Config) -> Result<()> {
    let lium = sdk(config)?;

    match action {
        FundCommands::Balance => {
            let balance = lium.balance().await?;
            println!("Balance: ${:.2}", balance);
        }
        FundCommands::Wallets => {
            let wallets = lium.wallets().await?;
            if wallets.is_empty() {
                print_info("No wallets linked. Use 'lium fund link --coldkey <SS58>'.");
                return Ok(());
            }
            let mut table = Table::new(vec!["#", "Wallet", "Linked"]);
            for (i, wallet) in wallets.iter().enumerate() {
                table.add_row(vec![
                    (i + 1).to_string(),
                    text(wallet, "wallet_hash"),
                    text(wallet, "created_at"),
                ]);
            }
            table.print();
        }
        FundCommands::Pay { amount } => {
            let url = lium.pay(amount).await?;
            print_success("Payment created. Complete it in your browser:");
            println!("{}", url);
        }
        FundCommands::Link { coldkey } => {
            lium.link_wallet(&coldkey, |access_key| {
                println!("Sign this access key with coldkey {}:", coldkey);
                println!("\n  {}\n", access_key);
                let signature = prompt_input("Signature (hex)", None)
                    .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
                normalize_signature(&signature)
            })
            .await?;
            print_success(&format!("Wallet {} linked", coldkey));
        }
    }
    Ok(())
}

fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("—")
        .to_string()
}

/// Hex signature with an optional `0x` prefix removed
pub fn normalize_signature(raw: &str) -> lium_api::Result<String> {
    let hex = raw.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::InvalidInput(
            "Signature must be a hex string".to_string(),
        ));
    }
    Ok(hex.to_lowercase())
}
