/// A destination the rule-based concierge knows about.
#[derive(Debug, Clone, Copy)]
pub struct Destination {
    pub name: &'static str,
    pub iata: &'static str,
    pub country: &'static str,
    pub tags: &'static [&'static str],
    /// Rough cost of a week for one traveller, flights excluded, in EUR.
    pub weekly_cost: f64,
    /// Months (1-12) with the most pleasant conditions.
    pub best_months: &'static [u32],
}

pub const DESTINATIONS: &[Destination] = &[
    Destination {
        name: "Paris",
        iata: "PAR",
        country: "France",
        tags: &["museums", "food", "art", "romance", "shopping", "history"],
        weekly_cost: 1400.0,
        best_months: &[4, 5, 6, 9, 10],
    },
    Destination {
        name: "Lisbon",
        iata: "LIS",
        country: "Portugal",
        tags: &["food", "history", "nightlife", "beach", "culture"],
        weekly_cost: 850.0,
        best_months: &[3, 4, 5, 6, 9, 10],
    },
    Destination {
        name: "Barcelona",
        iata: "BCN",
        country: "Spain",
        tags: &["beach", "food", "art", "nightlife", "architecture"],
        weekly_cost: 1100.0,
        best_months: &[5, 6, 9, 10],
    },
    Destination {
        name: "Rome",
        iata: "ROM",
        country: "Italy",
        tags: &["history", "food", "art", "museums", "architecture"],
        weekly_cost: 1150.0,
        best_months: &[4, 5, 9, 10],
    },
    Destination {
        name: "Reykjavik",
        iata: "REK",
        country: "Iceland",
        tags: &["nature", "hiking", "adventure", "northern lights"],
        weekly_cost: 1900.0,
        best_months: &[2, 3, 6, 7, 8, 9],
    },
    Destination {
        name: "Tokyo",
        iata: "TYO",
        country: "Japan",
        tags: &["food", "culture", "shopping", "technology", "nightlife"],
        weekly_cost: 1500.0,
        best_months: &[3, 4, 10, 11],
    },
    Destination {
        name: "Bangkok",
        iata: "BKK",
        country: "Thailand",
        tags: &["food", "nightlife", "culture", "shopping", "temples"],
        weekly_cost: 650.0,
        best_months: &[11, 12, 1, 2],
    },
    Destination {
        name: "Bali",
        iata: "DPS",
        country: "Indonesia",
        tags: &["beach", "nature", "wellness", "surfing", "temples"],
        weekly_cost: 700.0,
        best_months: &[5, 6, 7, 8, 9],
    },
    Destination {
        name: "New York",
        iata: "NYC",
        country: "United States",
        tags: &["museums", "food", "shopping", "nightlife", "art", "theatre"],
        weekly_cost: 2200.0,
        best_months: &[4, 5, 6, 9, 10, 12],
    },
    Destination {
        name: "Cancun",
        iata: "CUN",
        country: "Mexico",
        tags: &["beach", "nightlife", "diving", "history"],
        weekly_cost: 1000.0,
        best_months: &[12, 1, 2, 3, 4],
    },
    Destination {
        name: "Cape Town",
        iata: "CPT",
        country: "South Africa",
        tags: &["nature", "hiking", "wine", "beach", "adventure"],
        weekly_cost: 900.0,
        best_months: &[11, 12, 1, 2, 3],
    },
    Destination {
        name: "Innsbruck",
        iata: "INN",
        country: "Austria",
        tags: &["skiing", "hiking", "nature", "mountains"],
        weekly_cost: 1300.0,
        best_months: &[1, 2, 3, 7, 8],
    },
    Destination {
        name: "Marrakech",
        iata: "RAK",
        country: "Morocco",
        tags: &["culture", "shopping", "food", "history", "desert"],
        weekly_cost: 600.0,
        best_months: &[3, 4, 5, 10, 11],
    },
    Destination {
        name: "Sydney",
        iata: "SYD",
        country: "Australia",
        tags: &["beach", "surfing", "food", "nature", "nightlife"],
        weekly_cost: 1800.0,
        best_months: &[10, 11, 12, 1, 2, 3],
    },
    Destination {
        name: "Prague",
        iata: "PRG",
        country: "Czech Republic",
        tags: &["history", "architecture", "nightlife", "beer", "museums"],
        weekly_cost: 700.0,
        best_months: &[5, 6, 9, 12],
    },
    Destination {
        name: "Queenstown",
        iata: "ZQN",
        country: "New Zealand",
        tags: &["adventure", "hiking", "skiing", "nature", "wine"],
        weekly_cost: 1600.0,
        best_months: &[1, 2, 3, 7, 8, 12],
    },
];

pub fn find_by_iata(code: &str) -> Option<&'static Destination> {
    DESTINATIONS.iter().find(|d| d.iata.eq_ignore_ascii_case(code))
}
