use super::*;
use pretty_assertions::assert_eq;
use tern_ir::Name;

fn at(line: u32) -> SourceLoc {
    SourceLoc::new(Name::EMPTY, Name::EMPTY, line)
}

#[test]
fn errors_set_hard_error_flag() {
    let mut queue = DiagnosticQueue::new();
    assert!(!queue.has_hard_error());

    assert!(queue.push(Diagnostic::warning(ErrorCode::E2003).with_message("isset")));
    assert!(!queue.has_hard_error());

    assert!(queue.push(
        Diagnostic::error(ErrorCode::E2001)
            .with_message("mixing classes")
            .with_label(at(3), "here")
    ));
    assert!(queue.has_hard_error());
    assert_eq!(queue.error_count(), 1);
    assert_eq!(queue.warning_count(), 1);
}

#[test]
fn exact_duplicates_are_dropped() {
    let mut queue = DiagnosticQueue::new();
    let diag = Diagnostic::error(ErrorCode::E2004)
        .with_message("expected int")
        .with_label(at(10), "argument");

    assert!(queue.push(diag.clone()));
    assert!(!queue.push(diag));
    assert_eq!(queue.len(), 1);
}

#[test]
fn same_message_different_location_is_kept() {
    let mut queue = DiagnosticQueue::new();
    for line in [1, 2] {
        assert!(queue.push(
            Diagnostic::error(ErrorCode::E2004)
                .with_message("expected int")
                .with_label(at(line), "argument")
        ));
    }
    assert_eq!(queue.len(), 2);
}

#[test]
fn error_limit_ignores_warnings() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
        error_limit: 1,
        deduplicate: false,
    });

    assert!(queue.push(Diagnostic::error(ErrorCode::E2002).with_message("first")));
    assert!(queue.limit_reached());
    assert!(!queue.push(Diagnostic::error(ErrorCode::E2002).with_message("second")));
    assert!(queue.push(Diagnostic::warning(ErrorCode::E2003).with_message("still kept")));

    let flushed = queue.flush();
    let messages: Vec<_> = flushed.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "still kept"]);
}

#[test]
fn flush_resets_state() {
    let mut queue = DiagnosticQueue::new();
    let _ = queue.push(Diagnostic::error(ErrorCode::E2005).with_message("void"));
    let out = queue.flush();

    assert_eq!(out.len(), 1);
    assert!(queue.is_empty());
    assert!(!queue.has_hard_error());
    assert!(queue.push(Diagnostic::error(ErrorCode::E2005).with_message("void")));
}
