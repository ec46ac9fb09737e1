//! Data models for waterworks-service.

pub mod announcement;
pub mod bill;
pub mod customer;
pub mod message;
pub mod rate;
pub mod user;

pub use announcement::{Announcement, AnnouncementStatus, CreateAnnouncement, UpdateAnnouncement};
pub use bill::{
    Bill, BillDefaults, ListBillsFilter, NewBill, PaymentStatus, SettlementWrite, UpdateBill,
};
pub use customer::{
    CreateCustomer, CreditAdjustment, Customer, CustomerSort, ListCustomersFilter, UpdateCustomer,
};
pub use message::{Message, NewMessage};
pub use rate::{Barangay, DiscountOption, RateEntry};
pub use user::User;
