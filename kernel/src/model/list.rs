use shared::error::{AppError, AppResult};

/// ページネーションの範囲を指定するための設定値
///
/// `from` は先頭要素のオフセットだが、実際には `from / size` 番目のページとして
/// 解釈するため、`from` が `size` の倍数でない場合はページ先頭に切り下げられる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub page: i64,
    pub size: i64,
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;

impl ListOptions {
    pub fn from_offset(from: i64, size: i64) -> AppResult<Self> {
        if from < 0 {
            return Err(AppError::InvalidPagination(format!(
                "from must not be negative, got {from}"
            )));
        }
        if size <= 0 {
            return Err(AppError::InvalidPagination(format!(
                "size must be positive, got {size}"
            )));
        }
        Ok(Self {
            page: from / size,
            size,
        })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page * self.size
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}
