use anyhow::Result;
use car_catalog::config;
use car_catalog::pricing::{format_indian_price, format_lakh, PriceBreakup, PriceOptions};
use colored::Colorize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct QuoteArgs {
    pub price: f64,
    pub state: Option<String>,
    pub fuel: String,
    pub hypothecation: bool,
    pub fastag: bool,
    pub json: bool,
}

/// Execute the quote command
pub fn execute(config_path: &Path, args: QuoteArgs) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let calculator = cfg
        .pricing
        .build_calculator()
        .map_err(|e| anyhow::anyhow!("Invalid pricing configuration: {}", e))?;

    let state = args
        .state
        .unwrap_or_else(|| cfg.pricing.default_state.clone());
    let breakup = calculator.calculate(
        args.price,
        &state,
        &args.fuel,
        PriceOptions {
            hypothecation: args.hypothecation,
            fastag: args.fastag,
        },
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&breakup)?);
    } else {
        print!("{}", render_breakup(&breakup));
    }

    Ok(())
}

fn render_breakup(breakup: &PriceBreakup) -> String {
    let mut out = String::new();
    let mut line = |label: &str, amount: f64| {
        out.push_str(&format!("  {:<22} ₹ {:>14}\n", label, format_indian_price(amount)));
    };

    line("Ex-showroom price", breakup.ex_showroom_price);
    line("RTO charges", breakup.rto_charges);
    line("Road safety cess", breakup.road_safety_tax);
    line("Insurance", breakup.insurance);
    line("TCS", breakup.tcs);
    line("Other charges", breakup.other_charges);
    line("Hypothecation", breakup.hypothecation);
    line("FASTag", breakup.fastag);

    let mut header = format!(
        "{} {} / {}\n",
        "On-road price for".bold(),
        breakup.state,
        breakup.fuel_type.as_str()
    );
    if breakup.state_fallback {
        header.push_str(&format!("  {}\n", "(unknown state, default rates applied)".yellow()));
    }
    if breakup.fuel_type_fallback {
        header.push_str(&format!("  {}\n", "(unknown fuel type, Petrol rates applied)".yellow()));
    }

    format!(
        "{}{}  {:<22} ₹ {:>14}  ({})\n",
        header,
        out,
        "Total".bold(),
        format_indian_price(breakup.total_on_road_price).green(),
        format_lakh(breakup.total_on_road_price)
    )
}
