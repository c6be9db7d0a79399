use crate::geo::distance_km;
use crate::models::coordinate::Coordinate;
use crate::models::stop::DeliveryStop;

/// Orders `stops` by greedy nearest neighbour starting from `start`.
///
/// Each step takes the closest remaining stop to the current position; on a
/// tie the one that came first in the input wins. This is a heuristic, not a
/// shortest-tour solver.
pub fn sequence(start: Coordinate, stops: &[DeliveryStop]) -> Vec<DeliveryStop> {
    let mut remaining: Vec<&DeliveryStop> = stops.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = start;

    while let Some(index) = nearest_index(&current, &remaining) {
        let next = remaining.remove(index);
        current = next.pickup_coordinate;
        ordered.push(next.clone());
    }

    ordered
}

fn nearest_index(from: &Coordinate, candidates: &[&DeliveryStop]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, stop) in candidates.iter().enumerate() {
        let distance = distance_km(from, &stop.pickup_coordinate);
        // Strict less-than keeps the earliest candidate on ties.
        match best {
            Some((_, best_distance)) if distance.total_cmp(&best_distance).is_ge() => {}
            _ => best = Some((index, distance)),
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::sequence;
    use crate::models::coordinate::Coordinate;
    use crate::models::stop::{Cargo, DeliveryStop};

    const COPENHAGEN: Coordinate = Coordinate::new(55.676, 12.568);

    fn stop(name: &str, latitude: f64, longitude: f64) -> DeliveryStop {
        DeliveryStop::new(
            Coordinate::new(latitude, longitude),
            format!("{name}, Denmark"),
            name.to_string(),
            Cargo {
                weight_kg: 1.0,
                height_cm: 1.0,
                width_cm: 1.0,
                length_cm: 1.0,
            },
        )
    }

    fn names(stops: &[DeliveryStop]) -> Vec<&str> {
        stops.iter().map(|s| s.details.as_str()).collect()
    }

    #[test]
    fn empty_input_gives_empty_sequence() {
        assert!(sequence(COPENHAGEN, &[]).is_empty());
    }

    #[test]
    fn single_stop_is_returned_as_is() {
        let only = stop("Odense", 55.40, 10.38);
        assert_eq!(sequence(COPENHAGEN, std::slice::from_ref(&only)), vec![only]);
    }

    #[test]
    fn danish_cities_from_copenhagen() {
        let stops = vec![
            stop("Aarhus", 56.16, 10.20),
            stop("Odense", 55.40, 10.38),
            stop("Esbjerg", 55.47, 8.45),
        ];

        let ordered = sequence(COPENHAGEN, &stops);

        assert_eq!(names(&ordered), vec!["Odense", "Aarhus", "Esbjerg"]);
    }

    #[test]
    fn ties_go_to_the_earlier_stop() {
        let stops = vec![
            stop("first", 55.0, 10.0),
            stop("second", 55.0, 10.0),
            stop("third", 55.0, 10.0),
        ];

        let ordered = sequence(Coordinate::new(54.0, 10.0), &stops);

        assert_eq!(names(&ordered), vec!["first", "second", "third"]);
    }

    #[test]
    fn equidistant_stops_on_either_side_keep_input_order() {
        let stops = vec![stop("east", 0.0, 1.0), stop("west", 0.0, -1.0)];

        let ordered = sequence(Coordinate::new(0.0, 0.0), &stops);

        assert_eq!(names(&ordered), vec!["east", "west"]);
    }
}
