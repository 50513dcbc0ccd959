//! Pure planning for one-step reordering. The admin UI moves a project up or
//! down a single position; the persisted rewrite happens transactionally in
//! the repo.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Returns the new full order after moving `id` one step, or `None` when the
/// move is a no-op (first item up, last item down, or unknown id).
pub fn plan_move(ordered_ids: &[i64], id: i64, direction: MoveDirection) -> Option<Vec<i64>> {
    let index = ordered_ids.iter().position(|&p| p == id)?;
    let swap_with = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => {
            if index + 1 >= ordered_ids.len() {
                return None;
            }
            index + 1
        }
    };
    let mut order = ordered_ids.to_vec();
    order.swap(index, swap_with);
    Some(order)
}

/// The `(id, new_position)` pairs that differ between two orders; an
/// adjacent swap always yields exactly two.
pub fn changed_positions(old: &[i64], new: &[i64]) -> Vec<(i64, i32)> {
    new.iter()
        .enumerate()
        .filter(|(i, id)| old.get(*i) != Some(*id))
        .map(|(i, id)| (*id, i as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_the_middle_item_up_swaps_the_first_two() {
        let order = plan_move(&[10, 20, 30], 20, MoveDirection::Up).unwrap();
        assert_eq!(order, vec![20, 10, 30]);
        // Swapped ids land on positions [1, 0], third stays at 2.
        let changes = changed_positions(&[10, 20, 30], &order);
        assert_eq!(changes, vec![(20, 0), (10, 1)]);
    }

    #[test]
    fn moving_the_first_item_up_is_a_noop() {
        assert_eq!(plan_move(&[10, 20, 30], 10, MoveDirection::Up), None);
    }

    #[test]
    fn moving_the_last_item_down_is_a_noop() {
        assert_eq!(plan_move(&[10, 20, 30], 30, MoveDirection::Down), None);
    }

    #[test]
    fn moving_down_mirrors_moving_up() {
        let down = plan_move(&[10, 20, 30], 10, MoveDirection::Down).unwrap();
        assert_eq!(down, vec![20, 10, 30]);
    }

    #[test]
    fn unknown_id_is_a_noop() {
        assert_eq!(plan_move(&[10, 20, 30], 99, MoveDirection::Up), None);
    }

    #[test]
    fn single_item_cannot_move() {
        assert_eq!(plan_move(&[10], 10, MoveDirection::Up), None);
        assert_eq!(plan_move(&[10], 10, MoveDirection::Down), None);
    }
}
