use eframe::egui;

use crate::pin::Pin;

/// Returns the first pin, in iteration order, strictly closer than `radius`.
///
/// Earlier pins win over closer ones when markers overlap.
pub fn find_pin_at<'a, I>(point: egui::Pos2, pins: I, radius: f32) -> Option<&'a Pin>
where
    I: IntoIterator<Item = &'a Pin>,
{
    pins.into_iter().find(|pin| pin.pos().distance(point) < radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{PinId, Tag};

    fn pin(id: u64, x: f32, y: f32) -> Pin {
        Pin {
            id: PinId(id),
            x,
            y,
            title: String::new(),
            description: String::new(),
            tag: Tag::Default,
        }
    }

    #[test]
    fn none_outside_radius() {
        let pins = vec![pin(1, 0.0, 0.0), pin(2, 100.0, 100.0)];
        assert!(find_pin_at(egui::pos2(50.0, 50.0), &pins, 10.0).is_none());
        assert!(find_pin_at(egui::pos2(0.0, 0.0), &Vec::<Pin>::new(), 10.0).is_none());
    }

    #[test]
    fn radius_is_exclusive() {
        let pins = vec![pin(1, 0.0, 0.0)];
        assert!(find_pin_at(egui::pos2(10.0, 0.0), &pins, 10.0).is_none());
        assert_eq!(find_pin_at(egui::pos2(9.99, 0.0), &pins, 10.0).map(|p| p.id), Some(PinId(1)));
    }

    #[test]
    fn earliest_pin_wins_over_closest() {
        let pins = vec![pin(1, 0.0, 0.0), pin(2, 6.0, 0.0)];
        let hit = find_pin_at(egui::pos2(5.0, 0.0), &pins, 10.0);
        assert_eq!(hit.map(|p| p.id), Some(PinId(1)));
    }
}
