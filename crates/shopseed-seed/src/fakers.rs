//! Random field values for seeded rows.
//!
//! Every generator draws from the caller's RNG so runs are reproducible
//! from a seed.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::job::en::Title;
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{FirstName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rust_decimal::Decimal;

use shopseed_core::Size;

pub const COLOR_NAMES: &[&str] = &[
    "Black", "White", "Red", "Navy", "Olive", "Teal", "Maroon", "Beige", "Coral", "Indigo",
    "Lavender", "Mustard", "Charcoal", "Ivory", "Turquoise", "Crimson", "Salmon", "Khaki",
];

/// Price bounds in cents.
pub const MIN_PRICE_CENTS: i64 = 1_000;
pub const MAX_PRICE_CENTS: i64 = 20_000;

pub const MAX_STOCK: i32 = 100;
pub const MAX_INVENTORY_QUANTITY: i32 = 50;
/// Upper bound on units per sale, whatever the stock.
pub const MAX_SALE_QUANTITY: i32 = 2;

pub fn username<R: Rng + ?Sized>(rng: &mut R) -> String {
    Username().fake_with_rng(rng)
}

pub fn email<R: Rng + ?Sized>(rng: &mut R) -> String {
    SafeEmail().fake_with_rng(rng)
}

pub fn person_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    Name().fake_with_rng(rng)
}

pub fn job_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    Title().fake_with_rng(rng)
}

pub fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    PhoneNumber().fake_with_rng(rng)
}

pub fn company_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    CompanyName().fake_with_rng(rng)
}

pub fn company_email<R: Rng + ?Sized>(company: &str, rng: &mut R) -> String {
    let first: String = FirstName().fake_with_rng(rng);
    let mut domain = slugify(company);
    if domain.is_empty() {
        domain.push_str("supplier");
    }
    format!("{}@{domain}.com", slugify(&first))
}

pub fn address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let building: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);
    let state: String = StateAbbr().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    format!("{building} {street}, {city}, {state} {zip}")
}

pub fn color_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(COLOR_NAMES, rng).copied().unwrap_or("Black").to_string()
}

/// `<Word> <Colour>`, e.g. `Table Teal`.
pub fn product_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word: String = Word().fake_with_rng(rng);
    format!("{} {}", capitalize(&word), color_name(rng))
}

pub fn size<R: Rng + ?Sized>(rng: &mut R) -> Size {
    pick(&Size::ALL, rng).copied().unwrap_or(Size::M)
}

/// Uniform over whole cents, so the value is already rounded to 2 places.
pub fn price<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::new(rng.random_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS), 2)
}

pub fn stock_quantity<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.random_range(0..=MAX_STOCK)
}

pub fn inventory_quantity<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.random_range(1..=MAX_INVENTORY_QUANTITY)
}

/// Units for a sale against `stock`; `None` when nothing is left to sell.
pub fn sale_quantity<R: Rng + ?Sized>(stock: i32, rng: &mut R) -> Option<i32> {
    if stock <= 0 {
        return None;
    }
    Some(rng.random_range(1..=stock.min(MAX_SALE_QUANTITY)))
}

const SALT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SALT_LEN: usize = 22;

/// Alphanumeric salt shaped like the ones Django generates.
pub fn password_salt<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SALT_LEN)
        .map(|_| char::from(SALT_CHARS[rng.random_range(0..SALT_CHARS.len())]))
        .collect()
}

/// Split a generated full name into first name and the rest.
pub fn split_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

pub fn pick<'a, T, R: Rng + ?Sized>(values: &'a [T], rng: &mut R) -> Option<&'a T> {
    if values.is_empty() {
        return None;
    }
    values.get(rng.random_range(0..values.len()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn slugify(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn price_stays_within_bounds_with_two_decimals() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let min = Decimal::new(MIN_PRICE_CENTS, 2);
        let max = Decimal::new(MAX_PRICE_CENTS, 2);
        for _ in 0..500 {
            let value = price(&mut rng);
            assert!(value >= min && value <= max, "price {value} out of range");
            assert_eq!(value.scale(), 2);
        }
    }

    #[test]
    fn sale_quantity_is_capped_at_two_and_stock() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(sale_quantity(0, &mut rng), None);
        for _ in 0..100 {
            assert_eq!(sale_quantity(1, &mut rng), Some(1));
            let quantity = sale_quantity(80, &mut rng).unwrap_or_default();
            assert!((1..=2).contains(&quantity));
        }
    }

    #[test]
    fn product_name_is_capitalized_word_then_colour() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let name = product_name(&mut rng);
        let (word, colour) = name.rsplit_once(' ').expect("two words");
        assert!(word.chars().next().is_some_and(char::is_uppercase));
        assert!(COLOR_NAMES.contains(&colour));
    }

    #[test]
    fn company_email_uses_company_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let email = company_email("Acme & Sons, LLC", &mut rng);
        assert!(email.ends_with("@acmesonsllc.com"), "{email}");
    }

    #[test]
    fn salt_is_alphanumeric_and_dollar_free() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let salt = password_salt(&mut rng);
        assert_eq!(salt.len(), SALT_LEN);
        assert!(salt.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[test]
    fn split_name_keeps_multi_word_surnames() {
        assert_eq!(
            split_name("Ana de Souza"),
            ("Ana".to_string(), "de Souza".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn same_seed_gives_same_values() {
        let mut left = ChaCha8Rng::seed_from_u64(21);
        let mut right = ChaCha8Rng::seed_from_u64(21);
        assert_eq!(username(&mut left), username(&mut right));
        assert_eq!(address(&mut left), address(&mut right));
        assert_eq!(size(&mut left), size(&mut right));
    }
}
