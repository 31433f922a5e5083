use super::pagination::PageRequest;

#[test]
fn test_defaults() {
    let page = PageRequest::default();
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 20);
    assert_eq!(page.offset(), 0);
    assert_eq!(page.limit(), 20);
}

#[test]
fn test_offset_calculation() {
    let page = PageRequest::new(3, 25);
    assert_eq!(page.offset(), 50);
    assert_eq!(page.limit(), 25);
}

#[test]
fn test_page_zero_clamps_to_first() {
    let page = PageRequest::new(0, 10);
    assert_eq!(page.offset(), 0);
}
