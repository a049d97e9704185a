//! Coordinate recognition without any network access
//!
//! Shows which notations are understood, how they normalize to the canonical
//! `59.91000°N, 10.75000°E` form, and which inputs are rejected.

use kartsok::{CoordinateParser, Territory, format_canonical};

fn main() {
    let parser = CoordinateParser::new(Territory::NORWAY);

    let inputs = [
        "59.9139, 10.7522",
        "59.9139 10.7522",
        "N69.6492, E18.9553",
        "61°38'11\"N 8°18'45\"E",
        // Svalbard lies north of the mainland box
        "78 13 N 15 38 E",
        "59.91390°N, 10.75220°E",
        // Valid WGS84, outside the territory
        "48.8566, 2.3522",
        // Not a coordinate
        "Storgata 1",
        // Minutes must be below 60
        "59 75 0 N 10 45 0 E",
    ];

    for input in inputs {
        match parser.parse(input) {
            Some(parsed) => println!(
                "{input:<28} -> {} ({:?})",
                format_canonical(parsed.lat, parsed.lng),
                parsed.notation
            ),
            None => println!("{input:<28} -> no match"),
        }
    }
}
