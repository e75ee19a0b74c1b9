//! Utility functions and helpers

/// Format amount with proper decimals
pub fn format_amount(amount: u128, decimals: u8) -> String {
    let value = amount as f64 / 10_f64.powi(decimals as i32);
    format!("{:.6}", value)
}

/// Output units per input unit, adjusted for token decimals
pub fn calculate_price(input_amount: u128, input_decimals: u8, output_amount: u128, output_decimals: u8) -> f64 {
    if input_amount == 0 {
        return 0.0;
    }
    let input = input_amount as f64 / 10_f64.powi(input_decimals as i32);
    let output = output_amount as f64 / 10_f64.powi(output_decimals as i32);
    output / input
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
