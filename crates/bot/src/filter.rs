//! Client-side filtering of fetched listings against the user's criteria.
//!
//! The source already receives the same criteria as query parameters; this
//! pass catches what the upstream search lets through.

use jobwatch_core::{Listing, UserConfig};

/// True when `listing` satisfies every configured criterion.
pub fn matches(listing: &Listing, config: &UserConfig) -> bool {
    salary_ok(listing, config) && experience_ok(listing, config) && remote_ok(listing, config)
}

/// An unspecified salary passes; otherwise the top of the range must reach the minimum.
///
/// `MIN_SALARY` is in rubles. Offers in other currencies were already matched
/// by hh.ru's `salary` parameter, which converts currencies server-side, so
/// they are not compared here.
fn salary_ok(listing: &Listing, config: &UserConfig) -> bool {
    let Some(min) = config.min_salary() else {
        return true;
    };
    let Some(salary) = listing.salary.as_ref() else {
        return true;
    };
    if !salary.is_rubles() {
        return true;
    }
    match salary.upper_bound() {
        Some(top) => top >= min,
        None => true,
    }
}

fn experience_ok(listing: &Listing, config: &UserConfig) -> bool {
    match config.experience {
        None => true,
        Some(wanted) => listing.experience == Some(wanted),
    }
}

fn remote_ok(listing: &Listing, config: &UserConfig) -> bool {
    !config.remote_only || listing.remote
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwatch_core::{Experience, Salary};
    use std::time::Duration;

    fn config() -> UserConfig {
        UserConfig {
            queries: vec!["Frontend React".to_string()],
            min_salary: 0,
            experience: None,
            area: "113".to_string(),
            remote_only: false,
            check_interval: Duration::from_secs(600),
            per_page: 20,
        }
    }

    fn listing(from: Option<u64>, to: Option<u64>) -> Listing {
        Listing {
            id: "1".to_string(),
            title: "Frontend".to_string(),
            company: "Acme".to_string(),
            salary: (from.is_some() || to.is_some()).then(|| Salary {
                from,
                to,
                currency: Some("RUR".to_string()),
                gross: None,
            }),
            experience: Some(Experience::Between1And3),
            remote: false,
            area: None,
            url: "https://hh.ru/vacancy/1".to_string(),
            published_at: None,
            requirement: None,
            responsibility: None,
        }
    }

    #[test]
    fn everything_passes_without_criteria() {
        assert!(matches(&listing(None, None), &config()));
        assert!(matches(&listing(Some(10), None), &config()));
    }

    #[test]
    fn salary_uses_top_of_range() {
        let cfg = UserConfig { min_salary: 150_000, ..config() };
        assert!(!matches(&listing(Some(100_000), None), &cfg));
        assert!(matches(&listing(Some(180_000), None), &cfg));
        // `to` wins over `from`
        assert!(matches(&listing(Some(100_000), Some(160_000)), &cfg));
        assert!(!matches(&listing(Some(90_000), Some(120_000)), &cfg));
        assert!(matches(&listing(None, Some(150_000)), &cfg));
    }

    fn priced_in(currency: Option<&str>, from: u64) -> Listing {
        let mut l = listing(Some(from), None);
        if let Some(salary) = l.salary.as_mut() {
            salary.currency = currency.map(str::to_string);
        }
        l
    }

    #[test]
    fn foreign_currency_salaries_are_not_compared_as_rubles() {
        let cfg = UserConfig { min_salary: 150_000, ..config() };
        // hh.ru already converted these against the ruble floor
        assert!(matches(&priced_in(Some("USD"), 6_000), &cfg));
        assert!(matches(&priced_in(Some("KZT"), 200_000), &cfg));
        assert!(matches(&priced_in(Some("KZT"), 900_000), &cfg));
    }

    #[test]
    fn ruble_salaries_are_compared_whatever_the_code() {
        let cfg = UserConfig { min_salary: 150_000, ..config() };
        assert!(!matches(&priced_in(Some("RUB"), 100_000), &cfg));
        assert!(!matches(&priced_in(Some("rur"), 100_000), &cfg));
        assert!(!matches(&priced_in(None, 100_000), &cfg));
        assert!(matches(&priced_in(Some("RUB"), 150_000), &cfg));
    }

    #[test]
    fn unspecified_salary_passes_minimum() {
        let cfg = UserConfig { min_salary: 300_000, ..config() };
        assert!(matches(&listing(None, None), &cfg));
    }

    #[test]
    fn experience_must_match_exactly() {
        let cfg = UserConfig { experience: Some(Experience::Between3And6), ..config() };
        assert!(!matches(&listing(None, None), &cfg));

        let cfg = UserConfig { experience: Some(Experience::Between1And3), ..config() };
        assert!(matches(&listing(None, None), &cfg));

        let mut unknown = listing(None, None);
        unknown.experience = None;
        assert!(!matches(&unknown, &cfg));
    }

    #[test]
    fn remote_only_rejects_office_listings() {
        let cfg = UserConfig { remote_only: true, ..config() };
        let mut l = listing(None, None);
        assert!(!matches(&l, &cfg));
        l.remote = true;
        assert!(matches(&l, &cfg));
        assert!(matches(&l, &config()));
    }
}
