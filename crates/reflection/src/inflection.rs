//! Inflection helpers used by the naming conventions
//!
//! English-centric and intentionally small: relationship and model names are
//! identifiers chosen by programmers, not arbitrary prose.

/// Simple pluralization (English-centric)
pub fn pluralize(name: &str) -> String {
    if name.ends_with('y') && !ends_with_any(name, &["ay", "ey", "iy", "oy", "uy"]) {
        format!("{}ies", &name[..name.len() - 1])
    } else if ends_with_any(name, &["s", "sh", "ch", "x", "z"]) {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

/// Simple singularization (English-centric)
pub fn singularize(name: &str) -> String {
    if name.ends_with("ies") && name.len() > 3 {
        format!("{}y", &name[..name.len() - 3])
    } else if ends_with_any(name, &["sses", "ches", "shes", "xes", "zes", "iases"])
        || ends_with_consonant_uses(name)
    {
        name[..name.len() - 2].to_string()
    } else if name.ends_with('s') && !name.ends_with("ss") && name.len() > 1 {
        name[..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}

/// Convert a PascalCase or camelCase name to snake_case
///
/// Runs of capitals are kept together: `HTTPRequest` becomes `http_request`.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map_or(false, |n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert snake_case to PascalCase
pub fn camelize(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Convert snake_case to camelCase
pub fn lower_camelize(name: &str) -> String {
    let pascal = camelize(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => pascal,
    }
}

/// The model name a relationship named `name` points at by convention
///
/// `par_parents` and `par_parent` both give `ParParent`.
pub fn classify(name: &str) -> String {
    camelize(&singularize(name))
}

fn ends_with_any(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix))
}

/// `statuses`, `buses` and `bonuses` drop `es`; `houses` and `causes` only `s`
fn ends_with_consonant_uses(name: &str) -> bool {
    name.strip_suffix("uses")
        .and_then(|stem| stem.chars().last())
        .map_or(false, |c| c.is_ascii_alphabetic() && !"aeiou".contains(c))
}
