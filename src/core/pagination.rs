use crate::domain::model::Page;
use crate::utils::error::Result;
use std::future::Future;
use std::marker::PhantomData;

pub const FIRST_PAGE: u32 = 1;

/// Walks a paginated collection one batch at a time, starting at page 1.
///
/// The cursor stops when a page comes back empty (even if the API claims more
/// pages remain), when the API reports no further pages, or on the first
/// fetch error. Once stopped it keeps returning `None`.
pub struct PageCursor<T, F> {
    fetch: F,
    page: u32,
    finished: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> PageCursor<T, F>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            page: FIRST_PAGE,
            finished: false,
            _item: PhantomData,
        }
    }

    /// The page the next fetch will request, or the page that ended the walk.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub async fn next_batch(&mut self) -> Option<Result<Vec<T>>> {
        if self.finished {
            return None;
        }

        let page = match (self.fetch)(self.page).await {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        if page.items.is_empty() {
            self.finished = true;
            return None;
        }

        if page.has_more {
            self.page += 1;
        } else {
            self.finished = true;
        }

        Some(Ok(page.items))
    }

    /// 取完所有頁面；任何一頁失敗則丟棄已取得的資料
    pub async fn try_collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(batch) = self.next_batch().await {
            items.extend(batch?);
        }
        Ok(items)
    }
}
