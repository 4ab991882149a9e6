//! Static driver roster by season.
//!
//! A read-only (season, code) → (name, team) mapping used only as a fallback
//! enrichment source when the timing source gives no display name beyond the
//! driver code. Never required for correctness; an unknown code simply yields
//! no entry.

/// One roster entry for a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: &'static str,
    pub team: &'static str,
}

/// Look up a driver's roster entry for a season.
pub fn driver_info(season: i32, code: &str) -> Option<RosterEntry> {
    let (name, team) = match (season, code) {
        (2024, "VER") => ("Max Verstappen", "Red Bull Racing"),
        (2024, "PER") => ("Sergio Perez", "Red Bull Racing"),
        (2024, "HAM") => ("Lewis Hamilton", "Mercedes"),
        (2024, "RUS") => ("George Russell", "Mercedes"),
        (2024, "LEC") => ("Charles Leclerc", "Ferrari"),
        (2024, "SAI") => ("Carlos Sainz", "Ferrari"),
        (2024, "NOR") => ("Lando Norris", "McLaren"),
        (2024, "PIA") => ("Oscar Piastri", "McLaren"),
        (2024, "ALO") => ("Fernando Alonso", "Aston Martin"),
        (2024, "STR") => ("Lance Stroll", "Aston Martin"),
        (2024, "OCO") => ("Esteban Ocon", "Alpine"),
        (2024, "GAS") => ("Pierre Gasly", "Alpine"),
        (2024, "BOT") => ("Valtteri Bottas", "Alfa Romeo"),
        (2024, "ZHO") => ("Zhou Guanyu", "Alfa Romeo"),
        (2024, "MAG") => ("Kevin Magnussen", "Haas"),
        (2024, "HUL") => ("Nico Hulkenberg", "Haas"),
        (2024, "TSU") => ("Yuki Tsunoda", "AlphaTauri"),
        (2024, "RIC") => ("Daniel Ricciardo", "AlphaTauri"),
        (2024, "ALB") => ("Alexander Albon", "Williams"),
        (2024, "SAR") => ("Logan Sargeant", "Williams"),
        // Mid-season changes
        (2024, "DEV") => ("Nyck de Vries", "AlphaTauri"),
        (2024, "LAW") => ("Liam Lawson", "AlphaTauri"),

        (2025, "VER") => ("Max Verstappen", "Red Bull Racing"),
        (2025, "PER") => ("Sergio Perez", "Red Bull Racing"),
        (2025, "HAM") => ("Lewis Hamilton", "Ferrari"),
        (2025, "LEC") => ("Charles Leclerc", "Ferrari"),
        (2025, "RUS") => ("George Russell", "Mercedes"),
        (2025, "ANT") => ("Andrea Kimi Antonelli", "Mercedes"),
        (2025, "NOR") => ("Lando Norris", "McLaren"),
        (2025, "PIA") => ("Oscar Piastri", "McLaren"),
        (2025, "ALO") => ("Fernando Alonso", "Aston Martin"),
        (2025, "STR") => ("Lance Stroll", "Aston Martin"),
        (2025, "GAS") => ("Pierre Gasly", "Alpine"),
        (2025, "DOO") => ("Jack Doohan", "Alpine"),
        (2025, "HUL") => ("Nico Hulkenberg", "Sauber"),
        (2025, "BOT") => ("Valtteri Bottas", "Sauber"),
        (2025, "BEA") => ("Oliver Bearman", "Haas"),
        (2025, "OCO") => ("Esteban Ocon", "Haas"),
        (2025, "TSU") => ("Yuki Tsunoda", "RB"),
        (2025, "HAD") => ("Isack Hadjar", "RB"),
        (2025, "ALB") => ("Alexander Albon", "Williams"),
        (2025, "SAI") => ("Carlos Sainz", "Williams"),
        (2025, "COL") => ("Franco Colapinto", "Williams"),

        _ => return None,
    };
    Some(RosterEntry { name, team })
}
