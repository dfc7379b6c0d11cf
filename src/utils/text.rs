/// Splits text into lines of words, dropping lines that hold no words.
fn split_into_word_lines(text: &str) -> Vec<Vec<&str>> {
    text.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|words| !words.is_empty())
        .collect()
}

/// Keeps the trailing `n` words of `text`, preserving its line breaks.
///
/// Words are counted across all non-empty lines, starting from the end; the
/// earliest kept line is cut from the left when it holds more words than are
/// still needed. Whitespace inside a line is normalized to single spaces.
pub fn keep_last_n_words(text: &str, n: usize) -> String {
    let lines = split_into_word_lines(text);
    let mut remaining = n;
    let mut kept: Vec<&[&str]> = Vec::new();

    for words in lines.iter().rev() {
        if remaining == 0 {
            break;
        }
        if words.len() <= remaining {
            kept.push(words.as_slice());
            remaining -= words.len();
        } else {
            kept.push(&words[words.len() - remaining..]);
            remaining = 0;
        }
    }
    kept.reverse();

    kept.iter()
        .map(|words| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
