//! Submission services

pub mod submitter;
pub mod waiter;

#[cfg(test)]
pub(crate) mod test_support;
