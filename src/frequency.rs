//! Summaries over maintenance recurrence labels ("Mensal", "Trimestral", ...).

use std::collections::HashMap;

/// Returned when there is no label to summarise.
pub const UNKNOWN_FREQUENCY: &str = "N/A";

/// Most common recurrence label among the tasks of one asset.
///
/// Ties go to the label that appears first in `frequencies`. Labels are
/// trimmed before counting and blank labels are ignored; an input with no
/// usable label yields [`UNKNOWN_FREQUENCY`].
pub fn most_frequent<I, S>(frequencies: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // label -> (count, first position)
    let mut tally: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, label) in frequencies.into_iter().enumerate() {
        let label = label.as_ref().trim();
        if label.is_empty() {
            continue;
        }
        tally
            .entry(label.to_string())
            .or_insert((0, position))
            .0 += 1;
    }

    tally
        .into_iter()
        .min_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        })
        .map(|(label, _)| label)
        .unwrap_or_else(|| UNKNOWN_FREQUENCY.to_string())
}
