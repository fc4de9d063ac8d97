/// Characters per standard word.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute from correctly typed characters over `seconds`.
/// Zero when no time has passed.
pub fn wpm(correct_chars: usize, seconds: f64) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    let minutes = seconds / 60.0;
    ((correct_chars as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Accuracy percentage rounded to one decimal place. A session with nothing
/// typed is perfectly accurate.
pub fn accuracy(correct_chars: usize, total_typed: usize) -> f64 {
    if total_typed == 0 {
        return 100.0;
    }
    ((correct_chars as f64 / total_typed as f64) * 100.0 * 10.0).round() / 10.0
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}
