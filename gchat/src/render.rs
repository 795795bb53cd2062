//! Reply texts and country report rendering.

use gcountry::CountryRecord;

use crate::{ConversationState, ConversationStep};

pub const WELCOME_MESSAGE: &str = "Welcome to GlobeTalk! I can provide information about countries around the world.\nPlease enter a country name to get started.";
pub const FAREWELL_MESSAGE: &str = "Thank you for using GlobeTalk! Goodbye!";
pub const DETAILED_MODE_MESSAGE: &str =
    "Detailed mode activated. You'll receive more comprehensive information about countries.";
pub const SIMPLE_MODE_MESSAGE: &str =
    "Simple mode activated. You'll receive basic information about countries.";
pub const NEW_COUNTRY_MESSAGE: &str = "Please enter a new country name.";
pub const START_OVER_MESSAGE: &str = "Let's start over. Please enter a country name.";
pub const ENGINE_FAULT_MESSAGE: &str =
    "I encountered an error. Let's try again. Please enter a country name.";
pub const COUNTRY_UNAVAILABLE_MESSAGE: &str = "Country information not available.";

pub fn option_menu(country: &str) -> String {
    format!(
        "What would you like to know about {country}?\n\
         \n\
         A) Capital\n\
         B) National Animal\n\
         C) National Flower\n\
         D) Population and Area\n\
         E) All Information\n\
         F) Choose another country\n\
         G) Exit\n\
         \n\
         You can also toggle detailed mode by typing \"detailed\" or \"simple\".\n"
    )
}

pub fn invalid_option(country: &str) -> String {
    format!(
        "Invalid option. Please select one of the options (A-G).\n\n{}",
        option_menu(country)
    )
}

pub fn no_match(input: &str) -> String {
    format!("No country found matching '{input}'.\nPlease enter a valid country name.")
}

pub fn multiple_matches(matches: &[String]) -> String {
    format!(
        "Multiple matches found: {}.\nPlease be more specific.",
        matches.join(", ")
    )
}

pub fn selected(country: &str) -> String {
    format!("Selected {country}.\n\n{}", option_menu(country))
}

/// An answer followed by the menu again.
pub fn with_menu(answer: &str, country: &str) -> String {
    format!("{answer}\n\n{}", option_menu(country))
}

pub fn help(state: &ConversationState) -> String {
    match (&state.current_step, state.selected_country.as_deref()) {
        (ConversationStep::SelectCountry, _) => {
            "Please enter the name of a country you'd like to learn about. \
             I'll tell you about its capital, national symbols, and more!"
                .to_string()
        }
        (ConversationStep::ChooseOption, Some(country)) => format!(
            "Please select an option (A-G) to learn about {country}.\n\n{}",
            option_menu(country)
        ),
        _ => "I can provide information about countries. Enter a country name to get started."
            .to_string(),
    }
}

/// Full report for option E. Region, population, area, languages, currencies
/// and national bird are only shown in detailed mode.
pub fn country_report(record: Option<&CountryRecord>, detailed: bool) -> String {
    let Some(record) = record else {
        return COUNTRY_UNAVAILABLE_MESSAGE.to_string();
    };

    let mut lines = vec![
        format!("Information about {}:", record.display_name()),
        String::new(),
        format!("Capital: {}", record.capital_or_unknown()),
    ];

    if detailed {
        if let Some(region) = &record.region {
            match &record.subregion {
                Some(subregion) => lines.push(format!("Region: {region} ({subregion})")),
                None => lines.push(format!("Region: {region}")),
            }
        }
        if record.population > 0 {
            lines.push(format!("Population: {}", record.formatted_population()));
        }
        if record.area > 0.0 {
            lines.push(format!("Area: {}", record.formatted_area()));
        }
        if !record.languages.is_empty() {
            lines.push(format!("Languages: {}", record.languages.join(", ")));
        }
        if !record.currencies.is_empty() {
            lines.push(format!("Currencies: {}", record.currencies.join(", ")));
        }
    }

    if CountryRecord::has_known(&record.national_animal) {
        lines.push(format!("National Animal: {}", record.national_animal));
    }
    if CountryRecord::has_known(&record.national_flower) {
        lines.push(format!("National Flower: {}", record.national_flower));
    }
    if detailed && CountryRecord::has_known(&record.national_bird) {
        lines.push(format!("National Bird: {}", record.national_bird));
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}
