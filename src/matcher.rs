use std::collections::HashMap;

/// Canonical form used for all answer comparisons: surrounding whitespace
/// stripped, Unicode lowercase.
pub(crate) fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Ratcliff/Obershelp similarity between two strings, computed over Unicode
/// scalar values. Returns `2.0 * matched / (len_a + len_b)`, where `matched`
/// is the total length of the longest matching blocks found recursively on
/// both sides of each match. Two empty strings are fully similar.
pub(crate) fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &ch) in b.iter().enumerate() {
        b2j.entry(ch).or_default().push(j);
    }

    let mut matched = 0usize;
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(&a, &b2j, alo, ahi, blo, bhi);
        if k > 0 {
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
    }

    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

/// Finds the leftmost longest block `a[i..i+k] == b[j..j+k]` with
/// `alo <= i < i+k <= ahi` and `blo <= j < j+k <= bhi`, by walking `a` once
/// and extending runs recorded against the previous row.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best_i = alo;
    let mut best_j = blo;
    let mut best_size = 0usize;

    let mut run_lengths: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
        let mut new_runs: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = match j.checked_sub(1) {
                    Some(prev) => run_lengths.get(&prev).copied().unwrap_or(0) + 1,
                    None => 1,
                };
                new_runs.insert(j, k);
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        run_lengths = new_runs;
    }

    (best_i, best_j, best_size)
}

/// Grades a submitted answer against a question's accepted answers.
///
/// Per accepted answer, after normalizing both sides: exact equality, then
/// substring containment in either direction, then similarity ratio at or
/// above `threshold`. The first accepted answer that matches decides.
pub(crate) fn is_answer_correct(submitted: &str, accepted: &[String], threshold: f64) -> bool {
    let submitted = normalize_text(submitted);

    for answer in accepted {
        let answer = normalize_text(answer);

        if submitted == answer {
            return true;
        }

        if answer.contains(&submitted) || submitted.contains(&answer) {
            return true;
        }

        if similarity_ratio(&submitted, &answer) >= threshold {
            return true;
        }
    }

    false
}
