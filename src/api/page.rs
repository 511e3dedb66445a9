// Pagination result: one chunk of records plus its navigation schema.
use crate::core::document::Record;

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub data: Vec<Record>,
    pub schema: PageSchema,
}

/// `next_page` is always `current_page + 1`, even on the last page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageSchema {
    pub current_page: usize,
    pub next_page: usize,
    pub previous_page: Option<usize>,
}

impl PageSchema {
    pub fn for_page(page: usize) -> Self {
        Self {
            current_page: page,
            next_page: page + 1,
            previous_page: if page <= 1 { None } else { Some(page - 1) },
        }
    }
}

impl Page {
    pub fn new(data: Vec<Record>, page: usize) -> Self {
        Self {
            data,
            schema: PageSchema::for_page(page),
        }
    }
}
