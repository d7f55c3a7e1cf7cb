fn main() {
    responsive_donations_lib::run()
}
