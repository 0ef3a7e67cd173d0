mod helpers;

mod badges;
mod callbacks;
mod notifications;
mod orders;
mod payments;
