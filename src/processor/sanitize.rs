//! Turns build-file tokens into identifiers for the synthesized program.

/// `foo-bar` → `FooBar`, `hello.task` → `Hello_task`.
///
/// The first character is uppercased, every `.` becomes `_`, and a `-`
/// followed by a lowercase ASCII letter is dropped with the letter
/// uppercased. Any other `-` is kept.
pub fn sanitize_name(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let dotted: String = first
        .to_uppercase()
        .chain(chars)
        .map(|c| if c == '.' { '_' } else { c })
        .collect();

    let mut out = String::with_capacity(dotted.len());
    let mut rest = dotted.chars().peekable();
    while let Some(c) = rest.next() {
        match (c, rest.peek()) {
            ('-', Some(&next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                rest.next();
            }
            _ => out.push(c),
        }
    }
    out
}
