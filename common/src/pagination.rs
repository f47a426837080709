//! Abstractions for page-numbered (offset) pagination.

use std::num::NonZeroU32;

/// Pagination arguments: a 1-based page number and a page size.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Arguments {
    /// Number of the requested page, starting from `1`.
    page: NonZeroU32,

    /// Maximum number of items on a page.
    page_size: NonZeroU32,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            page: NonZeroU32::MIN,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Arguments {
    /// Page size used when none is requested.
    pub const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Largest page size that can be requested.
    pub const MAX_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(100) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Creates new [`Arguments`] out of the optionally provided `page` and
    /// `page_size`, falling back to the first page and the
    /// [`DEFAULT_PAGE_SIZE`].
    ///
    /// [`None`] is returned if any of the provided values is zero, negative or
    /// the `page_size` exceeds the [`MAX_PAGE_SIZE`].
    ///
    /// [`DEFAULT_PAGE_SIZE`]: Self::DEFAULT_PAGE_SIZE
    /// [`MAX_PAGE_SIZE`]: Self::MAX_PAGE_SIZE
    #[must_use]
    pub fn new<Num>(page: Option<Num>, page_size: Option<Num>) -> Option<Self>
    where
        Num: TryInto<u32>,
    {
        let page = match page {
            Some(p) => NonZeroU32::new(p.try_into().ok()?)?,
            None => NonZeroU32::MIN,
        };
        let page_size = match page_size {
            Some(s) => NonZeroU32::new(s.try_into().ok()?)?,
            None => Self::DEFAULT_PAGE_SIZE,
        };
        (page_size <= Self::MAX_PAGE_SIZE).then_some(Self { page, page_size })
    }

    /// Returns the requested page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.get()
    }

    /// Returns the requested page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    /// Returns how many items should be skipped before the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.page_size.get())
    }

    /// Returns how many items the requested page may contain.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size.get())
    }
}

/// A page of `N`odes.
#[derive(Clone, Debug)]
pub struct Page<N> {
    /// Nodes on this [`Page`].
    pub nodes: Vec<N>,

    /// [`Arguments`] this [`Page`] was selected with.
    pub arguments: Arguments,

    /// Indicator whether there are more nodes after this [`Page`].
    pub has_more: bool,
}

impl<N> Page<N> {
    /// Creates a new [`Page`] out of the selected `nodes`.
    ///
    /// The `nodes` are expected to be selected with a limit of one more than
    /// [`Arguments::limit()`], so the surplus node only indicates that there
    /// is a next page, and is cut off.
    #[must_use]
    pub fn new(arguments: Arguments, nodes: impl IntoIterator<Item = N>) -> Self {
        let mut nodes = nodes.into_iter().collect::<Vec<_>>();
        let limit = usize::try_from(arguments.limit()).unwrap_or(usize::MAX);
        let has_more = nodes.len() > limit;
        nodes.truncate(limit);
        Self {
            nodes,
            arguments,
            has_more,
        }
    }

    /// Maps the nodes of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(N) -> T) -> Page<T> {
        Page {
            nodes: self.nodes.into_iter().map(f).collect(),
            arguments: self.arguments,
            has_more: self.has_more,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug, Default)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page};

    #[test]
    fn defaults() {
        let args = Arguments::new::<i64>(None, None).unwrap();

        assert_eq!(args.page(), 1);
        assert_eq!(args.page_size(), 10);
        assert_eq!(args.offset(), 0);
        assert_eq!(args, Arguments::default());
    }

    #[test]
    fn offset() {
        let args = Arguments::new(Some(3), Some(20)).unwrap();

        assert_eq!(args.offset(), 40);
        assert_eq!(args.limit(), 20);
    }

    #[test]
    fn rejects_invalid() {
        assert!(Arguments::new(Some(0), None).is_none());
        assert!(Arguments::new(Some(-1), None).is_none());
        assert!(Arguments::new(None, Some(0)).is_none());
        assert!(Arguments::new(None, Some(101)).is_none());
        assert!(Arguments::new(None, Some(100)).is_some());
    }

    #[test]
    fn page_cuts_surplus() {
        let args = Arguments::new(Some(1), Some(2)).unwrap();

        let page = Page::new(args, [1, 2, 3]);
        assert_eq!(page.nodes, [1, 2]);
        assert!(page.has_more);

        let page = Page::new(args, [1, 2]);
        assert_eq!(page.nodes, [1, 2]);
        assert!(!page.has_more);
    }
}
