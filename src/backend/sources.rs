//! Reading apt source files. Both formats are turned into one-line entries
//! (`deb [options] uri suite components...`) so they go through the same identifier parsing.

const SOURCE_TYPES: [&str; 2] = ["deb", "deb-src"];

/// deb822 fields that become `[key=value]` options of a one-line entry.
const OPTION_FIELDS: [(&str, &str); 4] = [
    ("Architectures", "arch"),
    ("Languages", "lang"),
    ("Signed-By", "signed-by"),
    ("Trusted", "trusted"),
];

/// Source lines of a one-line `.list` file, comments stripped.
pub(crate) fn one_line_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or(line).trim())
        .filter(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|kind| SOURCE_TYPES.contains(&kind))
        })
        .map(str::to_string)
        .collect()
}

/// Every enabled stanza of a deb822 `.sources` file, expanded to one entry per
/// type, URI and suite.
pub(crate) fn deb822_entries(content: &str) -> Vec<String> {
    stanzas(content)
        .iter()
        .flat_map(|stanza| stanza_entries(stanza))
        .collect()
}

#[derive(Debug)]
struct Field {
    name: String,
    value: String,
    /// Value goes on in indented lines, as an inline signing key does.
    continued: bool,
}

fn stanzas(content: &str) -> Vec<Vec<Field>> {
    let mut stanzas = Vec::new();
    let mut current: Vec<Field> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                stanzas.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            if let Some(field) = current.last_mut() {
                field.continued = true;
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            current.push(Field {
                name: name.trim().to_string(),
                value: value.trim().to_string(),
                continued: false,
            });
        }
    }
    if !current.is_empty() {
        stanzas.push(current);
    }
    stanzas
}

fn field<'a>(stanza: &'a [Field], name: &str) -> Option<&'a Field> {
    stanza.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

fn values<'a>(stanza: &'a [Field], name: &str) -> Vec<&'a str> {
    field(stanza, name)
        .map(|f| f.value.split_whitespace().collect())
        .unwrap_or_default()
}

fn stanza_entries(stanza: &[Field]) -> Vec<String> {
    if field(stanza, "Enabled").is_some_and(|f| f.value.eq_ignore_ascii_case("no")) {
        return Vec::new();
    }

    let options: Vec<String> = OPTION_FIELDS
        .iter()
        .filter_map(|(name, option)| {
            let f = field(stanza, name)?;
            // inline keys have no one-line form
            if f.continued || f.value.is_empty() {
                return None;
            }
            Some(format!("{}={}", option, values(stanza, name).join(",")))
        })
        .collect();
    let options = if options.is_empty() {
        String::new()
    } else {
        format!(" [{}]", options.join(" "))
    };
    let components = values(stanza, "Components");

    let mut entries = Vec::new();
    for kind in values(stanza, "Types") {
        for uri in values(stanza, "URIs") {
            for suite in values(stanza, "Suites") {
                let mut entry = format!("{}{} {} {}", kind, options, uri, suite);
                for component in &components {
                    entry.push(' ');
                    entry.push_str(component);
                }
                entries.push(entry);
            }
        }
    }
    entries
}
