//! Canned code snippets for code-file generation requests.

/// Snippet offered when no algorithm in the request matches the table.
pub const DEFAULT_ALGORITHM: &str = "fibonacci";

const ALGORITHMS: &[(&str, &str)] = &[
    (
        "kadane",
        r"def kadane(arr):
    max_sum, current_sum = float('-inf'), 0
    for num in arr:
        current_sum = max(num, current_sum + num)
        max_sum = max(max_sum, current_sum)
    return max_sum",
    ),
    (
        "quicksort",
        r"def quicksort(arr):
    if len(arr) <= 1: return arr
    pivot = arr[len(arr)//2]
    return quicksort([x for x in arr if x < pivot]) + [x for x in arr if x == pivot] + quicksort([x for x in arr if x > pivot])",
    ),
    (
        "fibonacci",
        r"def fib(n):
    a, b = 0, 1
    for _ in range(n): a, b = b, a + b
    return a",
    ),
];

/// Case-insensitive snippet lookup, falling back to the default snippet.
pub fn snippet_for(algorithm: &str) -> &'static str {
    let key = algorithm.trim().to_lowercase();
    ALGORITHMS
        .iter()
        .find(|(name, _)| *name == key)
        .or_else(|| ALGORITHMS.iter().find(|(name, _)| *name == DEFAULT_ALGORITHM))
        .map(|(_, code)| *code)
        .unwrap_or("")
}

/// File extension for a language keyword found in the request.
///
/// "javascript" must be checked before "java" — the latter is a substring.
pub fn extension_for(language: &str) -> &'static str {
    let lang = language.to_lowercase();
    if lang.contains("javascript") {
        "js"
    } else if lang.contains("java") {
        "java"
    } else if lang.contains("cpp") {
        "cpp"
    } else if lang.contains("html") {
        "html"
    } else if lang.contains("css") {
        "css"
    } else {
        "py"
    }
}
