//! Low Income Tax Offset.

use rust_decimal::Decimal;

use crate::config::LitoConfig;

/// Calculates the Low Income Tax Offset for an annual taxable income.
///
/// The full offset applies up to the first threshold. It then reduces by the
/// first taper rate up to the second threshold, and by the second taper rate
/// beyond it, never going below zero.
///
/// # Example
///
/// ```
/// use repertoire_engine::calculation::calculate_lito;
/// use repertoire_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/au").unwrap();
/// let lito = &config.tax_year("2024-25").unwrap().lito;
///
/// assert_eq!(calculate_lito(Decimal::from(30_000), lito), Decimal::from(700));
/// assert_eq!(calculate_lito(Decimal::from(60_000), lito), Decimal::from(100));
/// ```
pub fn calculate_lito(income: Decimal, config: &LitoConfig) -> Decimal {
    if income <= config.full_offset_threshold {
        return config.max_offset;
    }

    let offset = if income <= config.first_taper_threshold {
        config.max_offset - (income - config.full_offset_threshold) * config.first_taper_rate
    } else {
        let first_reduction =
            (config.first_taper_threshold - config.full_offset_threshold) * config.first_taper_rate;
        let second_reduction = (income - config.first_taper_threshold) * config.second_taper_rate;
        config.max_offset - first_reduction - second_reduction
    };

    offset.max(Decimal::ZERO)
}
