use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecField {
    Genre,
    Place,
    Time,
    Theme,
    Tone,
    PointOfView,
    Characters,
    Premise,
}

impl SpecField {
    /// Fields in declaration order; missing fields are requested in this order.
    pub const ALL: [SpecField; 8] = [
        SpecField::Genre,
        SpecField::Place,
        SpecField::Time,
        SpecField::Theme,
        SpecField::Tone,
        SpecField::PointOfView,
        SpecField::Characters,
        SpecField::Premise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecField::Genre => "Genre",
            SpecField::Place => "Place",
            SpecField::Time => "Time",
            SpecField::Theme => "Theme",
            SpecField::Tone => "Tone",
            SpecField::PointOfView => "Point of View",
            SpecField::Characters => "Characters",
            SpecField::Premise => "Premise",
        }
    }

    /// Placeholder shown to the generator in the spec format template.
    pub fn hint(self) -> &'static str {
        match self {
            SpecField::Genre => "genre",
            SpecField::Place => "place",
            SpecField::Time => "period",
            SpecField::Theme => "main topics",
            SpecField::Tone => "tone",
            SpecField::PointOfView => "POV",
            SpecField::Characters => "use specific names already",
            SpecField::Premise => "describe some concrete events already",
        }
    }

    /// Field a free-form key refers to.
    ///
    /// The field name must occur in the key (case-insensitive) and make up at
    /// least half of it; keys matching zero or several fields are rejected.
    pub fn match_key(key: &str) -> Option<SpecField> {
        let key = key.trim().to_lowercase();
        let key_len = key.chars().count();
        let mut matched = SpecField::ALL.iter().copied().filter(|field| {
            let name = field.name().to_lowercase();
            key.contains(&name) && key_len <= 2 * name.chars().count()
        });
        match (matched.next(), matched.next()) {
            (Some(field), None) => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-field description of the book every later stage builds on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSpec {
    values: [String; 8],
}

const FENCE: &str = "\"\"\"";

impl BookSpec {
    pub fn get(&self, field: SpecField) -> &str {
        &self.values[field as usize]
    }

    pub fn set(&mut self, field: SpecField, value: impl Into<String>) {
        self.values[field as usize] = value.into();
    }

    fn append(&mut self, field: SpecField, text: &str) {
        if text.is_empty() {
            return;
        }
        let value = &mut self.values[field as usize];
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(text);
    }

    pub fn missing_fields(&self) -> Vec<SpecField> {
        SpecField::ALL
            .iter()
            .copied()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Copies every field that is empty here from `fallback`.
    pub fn fill_missing_from(&mut self, fallback: &BookSpec) {
        for field in self.missing_fields() {
            self.set(field, fallback.get(field));
        }
    }

    /// Extracts the spec fields from generated text.
    ///
    /// `Key: value` lines open a field, lines without a colon continue the
    /// field opened last. Lines with an unrecognized key, and their
    /// continuations, are ignored. When a `"""` fence shows up in the first
    /// half of the text, only the fenced part is read.
    pub fn parse(text: &str) -> Self {
        let half: String = text.chars().take(text.chars().count() / 2).collect();
        let mut body = text;
        if half.contains(FENCE) {
            if let Some((_, rest)) = text.split_once(FENCE) {
                body = rest.split_once(FENCE).map_or(rest, |(inner, _)| inner);
            }
        }

        let mut spec = BookSpec::default();
        let mut current: Option<SpecField> = None;
        for line in body.trim().lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => {
                    current = SpecField::match_key(key);
                    if let Some(field) = current {
                        spec.append(field, value.trim());
                    }
                }
                None => {
                    if let Some(field) = current {
                        spec.append(field, line);
                    }
                }
            }
        }
        spec
    }

    /// Value for `field` from a reply to a single-field request.
    ///
    /// The first line whose key names the field exactly (list markers aside)
    /// and carries a value wins.
    pub fn parse_field_reply(reply: &str, field: SpecField) -> Option<String> {
        reply.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim().trim_matches(|c: char| c == '-' || c == '*' || c == '#').trim();
            let value = value.trim();
            (key.eq_ignore_ascii_case(field.name()) && !value.is_empty()).then(|| value.to_string())
        })
    }

    /// `Key: value` lines in field order.
    pub fn to_text(&self) -> String {
        SpecField::ALL
            .iter()
            .map(|field| format!("{}: {}", field.name(), self.get(*field)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format template given to the generator.
    pub fn format_template() -> String {
        SpecField::ALL
            .iter()
            .map(|field| format!("{}: {}", field.name(), field.hint()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for BookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED: &str = "Genre: Literary thriller\n\
        Place: A fishing town on the Baltic coast\n\
        Time: Winter 1989\n\
        Theme: Loyalty, guilt\n\
        Tone: Bleak but warm\n\
        Point of View: First person, the harbour master\n\
        Characters: Jonas Berg, harbour master\n\
        Ilse Berg, his sister\n\
        Premise: A trawler returns without its crew.";

    #[test]
    fn test_parse_all_fields() {
        let spec = BookSpec::parse(GENERATED);
        assert!(spec.is_complete());
        assert_eq!(spec.get(SpecField::Genre), "Literary thriller");
        assert_eq!(spec.get(SpecField::PointOfView), "First person, the harbour master");
        assert_eq!(
            spec.get(SpecField::Characters),
            "Jonas Berg, harbour master Ilse Berg, his sister"
        );
    }

    #[test]
    fn test_continuation_never_creates_field() {
        let spec = BookSpec::parse("Genre: Fantasy\nGarbageLine\nOther: Y");
        assert_eq!(spec.get(SpecField::Genre), "Fantasy GarbageLine");
        assert_eq!(spec.missing_fields().len(), 7);
    }

    #[test]
    fn test_unknown_key_swallows_its_continuation() {
        let spec = BookSpec::parse("Tone: Grim\nMood: Dark\nstill the mood\nPlace: Oslo");
        assert_eq!(spec.get(SpecField::Tone), "Grim");
        assert_eq!(spec.get(SpecField::Place), "Oslo");
    }

    #[test]
    fn test_key_must_be_mostly_field_name() {
        assert_eq!(SpecField::match_key("**Genre**"), Some(SpecField::Genre));
        assert_eq!(SpecField::match_key("Narrative point of view"), Some(SpecField::PointOfView));
        assert_eq!(SpecField::match_key("The overall tone of the book"), None);
        assert_eq!(SpecField::match_key("Time and Place"), None);
        assert_eq!(SpecField::match_key("Setting"), None);
    }

    #[test]
    fn test_parse_reads_inside_fence() {
        let text = "Sure! Here it is:\n\"\"\"\nGenre: Horror\nPlace: Attic\n\"\"\"\nHope this helps with the rest of your very long novel project.";
        let spec = BookSpec::parse(text);
        assert_eq!(spec.get(SpecField::Genre), "Horror");
        assert_eq!(spec.get(SpecField::Place), "Attic");
        assert_eq!(spec.missing_fields().len(), 6);
    }

    #[test]
    fn test_to_text_round_trips() {
        let spec = BookSpec::parse(GENERATED);
        let text = spec.to_text();
        assert!(text.starts_with("Genre: Literary thriller\nPlace: "));
        assert_eq!(text.lines().count(), 8);
        assert_eq!(BookSpec::parse(&text), spec);
    }

    #[test]
    fn test_fill_missing_from() {
        let old = BookSpec::parse(GENERATED);
        let mut new = BookSpec::parse("Genre: Noir thriller\nPremise: A trawler returns empty and burning.");
        new.fill_missing_from(&old);
        assert!(new.is_complete());
        assert_eq!(new.get(SpecField::Genre), "Noir thriller");
        assert_eq!(new.get(SpecField::Place), old.get(SpecField::Place));
    }

    #[test]
    fn test_parse_field_reply() {
        assert_eq!(
            BookSpec::parse_field_reply("Tone: Wry and tender", SpecField::Tone),
            Some("Wry and tender".to_string())
        );
        assert_eq!(
            BookSpec::parse_field_reply("Here you go.\n- Point of View: Third person", SpecField::PointOfView),
            Some("Third person".to_string())
        );
        assert_eq!(BookSpec::parse_field_reply("Mood: Wry", SpecField::Tone), None);
        assert_eq!(BookSpec::parse_field_reply("Tone:", SpecField::Tone), None);
        assert_eq!(BookSpec::parse_field_reply("", SpecField::Tone), None);
    }
}
