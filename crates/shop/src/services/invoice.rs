//! Invoice PDF rendering.
//!
//! Renders a single-page A4 invoice for an order entirely in memory. The
//! total is recomputed from the snapshot lines on every render; nothing is
//! read from disk or cached.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use maplecart_core::OrderId;

use crate::models::{Order, OrderItem, order_total};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

const HEADER_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 14.0;
const LEADING: f32 = 22.0;

/// Canonical invoice filename for an order.
#[must_use]
pub fn filename(order_id: OrderId) -> String {
    format!("invoice-{order_id}.pdf")
}

/// Render the invoice for an order as a PDF document.
#[must_use]
pub fn render(order: &Order, items: &[OrderItem]) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let bold_font_id = Ref::new(5);
    let content_id = Ref::new(6);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
    page.parent(page_tree_id);
    page.contents(content_id);
    let mut resources = page.resources();
    let mut fonts = resources.fonts();
    fonts.pair(Name(b"F1"), font_id);
    fonts.pair(Name(b"F2"), bold_font_id);
    fonts.finish();
    resources.finish();
    page.finish();

    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_font_id).base_font(Name(b"Helvetica-Bold"));

    let mut content = Content::new();

    // Underlined header with the order number.
    let header = format!("Invoice #{}", order.id);
    let header_y = PAGE_HEIGHT - MARGIN - HEADER_SIZE;
    content.begin_text();
    content.set_font(Name(b"F2"), HEADER_SIZE);
    content.next_line(MARGIN, header_y);
    content.show(Str(header.as_bytes()));
    content.end_text();

    content.move_to(MARGIN, header_y - 4.0);
    content.line_to(PAGE_WIDTH - MARGIN, header_y - 4.0);
    content.stroke();

    // One line per item, then a separator and the recomputed total.
    content.begin_text();
    content.set_font(Name(b"F1"), BODY_SIZE);
    content.next_line(MARGIN, header_y - 2.0 * LEADING);

    for item in items {
        let line = format!("{} - {} x ${}", item.title, item.quantity, item.price);
        content.show(Str(line.as_bytes()));
        content.next_line(0.0, -LEADING);
    }

    content.show(Str(b"---"));
    content.next_line(0.0, -LEADING);

    let total = format!("Total: ${}", order_total(items));
    content.set_font(Name(b"F2"), HEADER_SIZE);
    content.show(Str(total.as_bytes()));
    content.end_text();

    pdf.stream(content_id, &content.finish());
    pdf.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use maplecart_core::{ProductId, UserId};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(42),
            user_id: UserId::new(1),
            created_at: Utc::now(),
        }
    }

    fn item(title: &str, price: &str, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: Some(ProductId::new(1)),
            title: title.to_owned(),
            description: String::new(),
            price: price.parse().unwrap(),
            quantity,
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        count(haystack, needle) > 0
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&order(), &[item("Maple Syrup", "12.50", 1)]);
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_render_includes_recomputed_total() {
        let items = vec![item("A", "10.00", 1), item("B", "5.00", 2)];
        let bytes = render(&order(), &items);

        assert!(contains(&bytes, b"Total: $20.00"));
    }

    #[test]
    fn test_render_includes_order_number_and_lines() {
        let bytes = render(&order(), &[item("Maple Syrup", "12.50", 3)]);

        assert!(contains(&bytes, b"Invoice #42"));
        assert!(contains(&bytes, b"Maple Syrup - 3 x $12.50"));
    }

    #[test]
    fn test_total_uses_bold_face_at_header_size() {
        let bytes = render(&order(), &[item("Maple Syrup", "12.50", 1)]);

        // Bold 20pt appears twice: once for the header, once for the total
        assert_eq!(count(&bytes, b"/F2 20 Tf"), 2);
        assert_eq!(count(&bytes, b"/F1 14 Tf"), 1);
    }

    #[test]
    fn test_filename_format() {
        assert_eq!(filename(OrderId::new(7)), "invoice-7.pdf");
    }
}
